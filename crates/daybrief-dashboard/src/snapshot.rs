use daybrief_providers::{Location, NewsBundle, Weather};
use serde::Serialize;

use crate::settings::UserSettings;

/// Per-group loading flags. A flag is set exactly while its fetch is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadingFlags {
    pub location: bool,
    pub weather: bool,
    pub news: bool,
}

impl LoadingFlags {
    pub fn all() -> Self {
        Self {
            location: true,
            weather: true,
            news: true,
        }
    }

    pub fn any(&self) -> bool {
        self.location || self.weather || self.news
    }
}

/// Per-group error text, suitable for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorMessages {
    pub location: Option<String>,
    pub weather: Option<String>,
    pub news: Option<String>,
}

/// Everything the presentation layer renders. Only the dashboard writes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub location: Option<Location>,
    pub weather: Option<Weather>,
    pub news: NewsBundle,
    pub settings: UserSettings,
    pub loading: LoadingFlags,
    pub errors: ErrorMessages,
}

impl DashboardSnapshot {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            location: None,
            weather: None,
            news: NewsBundle::default(),
            settings,
            loading: LoadingFlags::default(),
            errors: ErrorMessages::default(),
        }
    }

    pub fn is_any_loading(&self) -> bool {
        self.loading.any()
    }

    /// No group is reported as both loading and failed.
    pub fn is_consistent(&self) -> bool {
        !(self.loading.location && self.errors.location.is_some())
            && !(self.loading.weather && self.errors.weather.is_some())
            && !(self.loading.news && self.errors.news.is_some())
    }
}

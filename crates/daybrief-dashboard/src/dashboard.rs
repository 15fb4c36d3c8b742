//! Aggregation orchestrator.
//!
//! A refresh cycle resolves the location first, then fetches weather and
//! news concurrently. Each group writes only its own slice of the snapshot
//! and clears its own loading flag, so a slow group never holds back another.
//! Overlapping cycles are not cancelled; the last write to each slice wins.

use std::sync::Arc;

use daybrief_providers::{Location, NewsBundle, Providers};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::settings::{SettingsStore, UserSettings};
use crate::snapshot::{DashboardSnapshot, ErrorMessages, LoadingFlags};

/// Weather error shown when there are no coordinates to ask about.
pub const NO_LOCATION_WEATHER_ERROR: &str = "Weather unavailable without a location";

/// Operations the presentation layer can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    Refresh,
    UpdateSettings(UserSettings),
    AddInterest(String),
    RemoveInterest(String),
    SetDisplayName(String),
    ToggleTheme,
}

struct Inner {
    providers: Providers,
    store: SettingsStore,
    state: watch::Sender<DashboardSnapshot>,
}

/// Cheaply cloneable handle to the dashboard state and its operations.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("snapshot", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Build a dashboard; settings are loaded from the store once, here.
    pub fn new(providers: Providers, store: SettingsStore) -> Self {
        let settings = store.load();
        let (state, _) = watch::channel(DashboardSnapshot::new(settings));

        Self {
            inner: Arc::new(Inner {
                providers,
                store,
                state,
            }),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn settings(&self) -> UserSettings {
        self.inner.state.borrow().settings.clone()
    }

    /// Resolve once no loading flag is set.
    pub async fn wait_until_settled(&self) -> DashboardSnapshot {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| !s.is_any_loading()).await;
        match settled {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    pub async fn dispatch(&self, command: DashboardCommand) {
        tracing::debug!("Dispatching {:?}", command);
        match command {
            DashboardCommand::Refresh => self.refresh().await,
            DashboardCommand::UpdateSettings(settings) => self.update_settings(settings).await,
            DashboardCommand::AddInterest(topic) => {
                let mut settings = self.settings();
                if settings.add_interest(&topic) {
                    self.update_settings(settings).await;
                } else {
                    tracing::debug!("Ignoring blank or duplicate interest {:?}", topic);
                }
            }
            DashboardCommand::RemoveInterest(topic) => {
                let mut settings = self.settings();
                if settings.remove_interest(&topic) {
                    self.update_settings(settings).await;
                } else {
                    tracing::debug!("Interest {:?} not present", topic);
                }
            }
            DashboardCommand::SetDisplayName(name) => {
                let mut settings = self.settings();
                settings.display_name = name.trim().to_string();
                self.update_settings(settings).await;
            }
            DashboardCommand::ToggleTheme => {
                let mut settings = self.settings();
                settings.theme = settings.theme.toggled();
                self.update_settings(settings).await;
            }
        }
    }

    /// Run `dispatch` on the tokio runtime without waiting for it.
    pub fn spawn_dispatch(&self, command: DashboardCommand) -> JoinHandle<()> {
        let dashboard = self.clone();
        tokio::spawn(async move { dashboard.dispatch(command).await })
    }

    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        self.spawn_dispatch(DashboardCommand::Refresh)
    }

    /// Run a full refresh cycle: locate, then weather and news concurrently.
    pub async fn refresh(&self) {
        tracing::info!("Starting refresh cycle");
        self.update(|s| {
            s.loading = LoadingFlags::all();
            s.errors = ErrorMessages::default();
        });

        let location = self.load_location().await;
        let interests = self.settings().interests;

        match location {
            Some(location) => {
                tokio::join!(
                    self.load_weather(&location),
                    self.load_news(&interests, Some(&location))
                );
            }
            None => {
                self.update(|s| {
                    s.weather = None;
                    s.loading.weather = false;
                    s.errors.weather = Some(NO_LOCATION_WEATHER_ERROR.to_string());
                });
                self.load_news(&interests, None).await;
            }
        }

        tracing::info!("Refresh cycle finished");
    }

    /// Persist new settings, publish them immediately, then refetch news only.
    pub async fn update_settings(&self, settings: UserSettings) {
        let settings = settings.normalized();
        self.inner.store.save(&settings);

        let mut location = None;
        self.update(|s| {
            s.settings = settings.clone();
            s.loading.news = true;
            s.errors.news = None;
            location = s.location.clone();
        });

        tracing::info!(
            "Settings updated, refetching news for {} interests",
            settings.interests.len()
        );
        self.load_news(&settings.interests, location.as_ref()).await;
    }

    async fn load_location(&self) -> Option<Location> {
        match self.inner.providers.location.locate().await {
            Ok(location) => {
                let found = location.clone();
                self.update(|s| {
                    s.location = Some(found);
                    s.loading.location = false;
                    s.errors.location = None;
                });
                Some(location)
            }
            Err(e) => {
                tracing::warn!("Location lookup failed: {}", e);
                self.update(|s| {
                    s.location = None;
                    s.loading.location = false;
                    s.errors.location = Some(e.user_message().to_string());
                });
                None
            }
        }
    }

    async fn load_weather(&self, location: &Location) {
        let result = self
            .inner
            .providers
            .weather
            .current(location.latitude, location.longitude)
            .await;

        match result {
            Ok(weather) => {
                tracing::info!("Weather: {}°C, {}", weather.temperature, weather.condition);
                self.update(|s| {
                    s.weather = Some(weather);
                    s.loading.weather = false;
                    s.errors.weather = None;
                });
            }
            Err(e) => {
                tracing::warn!("Weather fetch failed: {}", e);
                self.update(|s| {
                    s.weather = None;
                    s.loading.weather = false;
                    s.errors.weather = Some(e.user_message().to_string());
                });
            }
        }
    }

    /// Fetch all four categories concurrently; local only with a location.
    async fn load_news(&self, interests: &[String], location: Option<&Location>) {
        let news = &self.inner.providers.news;

        let local = async {
            match location {
                Some(location) => news.local(location).await,
                None => Vec::new(),
            }
        };

        let (general, education, technology, local) = tokio::join!(
            news.general(),
            news.education(),
            news.technology(interests),
            local
        );

        let bundle = NewsBundle {
            general,
            education,
            technology,
            local,
        };
        tracing::info!("Loaded {} headlines", bundle.total());

        self.update(|s| {
            s.news = bundle;
            s.loading.news = false;
            s.errors.news = None;
        });
    }

    fn update(&self, modify: impl FnOnce(&mut DashboardSnapshot)) {
        self.inner.state.send_modify(|snapshot| {
            modify(snapshot);
            debug_assert!(snapshot.is_consistent());
        });
    }
}

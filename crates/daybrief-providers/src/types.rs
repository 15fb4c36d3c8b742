use chrono::{DateTime, NaiveDateTime, Utc};
use daybrief_core::NetworkError;
use serde::{Deserialize, Serialize};

/// Label used when a WMO code is not in the lookup table.
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Convert a WMO weather code to a human-readable label.
/// See: https://open-meteo.com/en/docs#weathervariables
pub fn condition_label(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => UNKNOWN_CONDITION,
    }
}

/// Location resolved from the caller's IP address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region: Option<String>,
}

impl Location {
    /// Search phrase used for local headlines, e.g. "Paris France".
    pub fn news_query(&self) -> String {
        format!("{} {}", self.city, self.country)
    }

    /// "City, Region" or "City, Country" for display
    pub fn display_name(&self) -> String {
        match self.region.as_deref().filter(|r| !r.is_empty() && *r != self.city) {
            Some(region) => format!("{}, {}", self.city, region),
            None => format!("{}, {}", self.city, self.country),
        }
    }
}

/// Current weather conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Degrees Celsius, rounded to the nearest integer
    pub temperature: i32,
    pub condition: String,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_code: i32,
    /// Provider timestamp as sent, local time without offset
    pub observation_time: String,
}

impl Weather {
    /// Parse the observation time (`YYYY-MM-DDTHH:MM`, optionally with seconds).
    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.observation_time, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.observation_time, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }
}

/// A single headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fixed news groupings shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    General,
    Education,
    Technology,
    Local,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 4] = [
        NewsCategory::General,
        NewsCategory::Education,
        NewsCategory::Technology,
        NewsCategory::Local,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::General => "World News",
            Self::Education => "Education",
            Self::Technology => "Tech News",
            Self::Local => "Local News",
        }
    }
}

/// Headlines for every category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsBundle {
    pub general: Vec<NewsItem>,
    pub education: Vec<NewsItem>,
    pub technology: Vec<NewsItem>,
    pub local: Vec<NewsItem>,
}

impl NewsBundle {
    pub fn get(&self, category: NewsCategory) -> &[NewsItem] {
        match category {
            NewsCategory::General => &self.general,
            NewsCategory::Education => &self.education,
            NewsCategory::Technology => &self.technology,
            NewsCategory::Local => &self.local,
        }
    }

    pub fn total(&self) -> usize {
        NewsCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }
}

/// Location lookup errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("{provider} request failed: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: NetworkError,
    },
    #[error("{provider} rejected the lookup: {reason}")]
    Rejected {
        provider: &'static str,
        reason: String,
    },
    #[error("All location providers failed (last: {0})")]
    AllProvidersFailed(Box<LocationError>),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        "Failed to detect location"
    }
}

/// Weather lookup errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Weather API returned status {status}")]
    Api { status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        "Failed to fetch weather"
    }
}

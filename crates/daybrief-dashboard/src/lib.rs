//! Dashboard state for Daybrief: settings persistence and the refresh orchestrator.

pub mod dashboard;
pub mod greeting;
pub mod settings;
pub mod snapshot;

pub use dashboard::{Dashboard, DashboardCommand, NO_LOCATION_WEATHER_ERROR};
pub use greeting::greeting;
pub use settings::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SettingsStore, Theme, UserSettings,
    SETTINGS_KEY, SUGGESTED_TOPICS,
};
pub use snapshot::{DashboardSnapshot, ErrorMessages, LoadingFlags};

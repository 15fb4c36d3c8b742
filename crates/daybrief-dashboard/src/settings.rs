//! User settings and their best-effort persistence.
//!
//! Settings live as one JSON record under [`SETTINGS_KEY`] in an injected
//! [`KeyValueStore`]. Loading fills every missing or malformed field from the
//! defaults individually, so records written by older versions keep working.
//! Saving never fails visibly; errors are logged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use daybrief_core::StorageError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logical key of the persisted settings record.
pub const SETTINGS_KEY: &str = "dashboard_user_settings";

/// Topics offered in the settings panel.
pub const SUGGESTED_TOPICS: [&str; 16] = [
    "React",
    "JavaScript",
    "Python",
    "Java",
    "TypeScript",
    "Rust",
    "AI",
    "Machine Learning",
    "Web Development",
    "Mobile",
    "Cloud",
    "DevOps",
    "Blockchain",
    "Cybersecurity",
    "Data Science",
    "Go",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl Theme {
    /// Header toggle: dark goes to light, everything else to dark.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light | Theme::System => Theme::Dark,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Tech topics in insertion order, no duplicates
    pub interests: Vec<String>,
    pub display_name: String,
    pub theme: Theme,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            interests: vec![
                "React".to_string(),
                "JavaScript".to_string(),
                "Python".to_string(),
            ],
            display_name: String::new(),
            theme: Theme::Light,
        }
    }
}

impl UserSettings {
    /// Add a topic after trimming. Returns false for blanks and duplicates.
    pub fn add_interest(&mut self, topic: &str) -> bool {
        let trimmed = topic.trim();
        if trimmed.is_empty() || self.interests.iter().any(|t| t == trimmed) {
            return false;
        }
        self.interests.push(trimmed.to_string());
        true
    }

    pub fn remove_interest(&mut self, topic: &str) -> bool {
        let before = self.interests.len();
        self.interests.retain(|t| t != topic);
        self.interests.len() != before
    }

    /// Same settings with interests trimmed, blanks dropped, and duplicates
    /// removed keeping the first occurrence.
    pub fn normalized(mut self) -> Self {
        self.interests = normalize_interests(self.interests.iter().map(String::as_str));
        self
    }

    /// Suggested topics not already chosen, at most `limit`.
    pub fn suggested_topics(&self, limit: usize) -> Vec<&'static str> {
        SUGGESTED_TOPICS
            .iter()
            .copied()
            .filter(|s| !self.interests.iter().any(|t| t == s))
            .take(limit)
            .collect()
    }

    /// Rebuild settings from a stored JSON object, one field at a time.
    ///
    /// Accepts the legacy keys `techInterests` and `name`.
    fn merge_over_defaults(record: &Map<String, Value>) -> Self {
        let defaults = Self::default();

        let interests = field(record, "interests", "techInterests")
            .and_then(Value::as_array)
            .map(|topics| normalize_interests(topics.iter().filter_map(Value::as_str)))
            .unwrap_or(defaults.interests);

        let display_name = field(record, "displayName", "name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.display_name);

        let theme = record
            .get("theme")
            .and_then(Value::as_str)
            .and_then(Theme::parse)
            .unwrap_or(defaults.theme);

        Self {
            interests,
            display_name,
            theme,
        }
    }
}

fn field<'a>(record: &'a Map<String, Value>, key: &str, legacy: &str) -> Option<&'a Value> {
    record.get(key).or_else(|| record.get(legacy))
}

fn normalize_interests<'a>(topics: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut normalized = UserSettings {
        interests: Vec::new(),
        ..Default::default()
    };
    for topic in topics {
        normalized.add_interest(topic);
    }
    normalized.interests
}

/// Synchronous string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local store, used in tests and when no settings directory is available.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid key {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write then rename so a crash never leaves a half-written record
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Loads and saves [`UserSettings`] through a [`KeyValueStore`].
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn on_disk<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(Arc::new(FileKeyValueStore::new(dir)))
    }

    /// Last saved settings merged over defaults; defaults when missing or corrupt.
    pub fn load(&self) -> UserSettings {
        let raw = match self.backend.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No saved settings, using defaults");
                return UserSettings::default();
            }
            Err(e) => {
                tracing::error!("Failed to load settings: {}", e);
                return UserSettings::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(record)) => UserSettings::merge_over_defaults(&record),
            Ok(_) => {
                tracing::warn!("Saved settings are not a JSON object, using defaults");
                UserSettings::default()
            }
            Err(e) => {
                tracing::warn!("Saved settings are corrupt ({}), using defaults", e);
                UserSettings::default()
            }
        }
    }

    /// Overwrite the stored record. Failures are logged, not returned.
    pub fn save(&self, settings: &UserSettings) {
        let json = match serde_json::to_string(settings) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(
                    "Failed to save settings: {}",
                    StorageError::Serialization(e.to_string())
                );
                return;
            }
        };

        match self.backend.set(SETTINGS_KEY, &json) {
            Ok(()) => tracing::debug!("Saved settings ({} interests)", settings.interests.len()),
            Err(e) => tracing::error!("Failed to save settings: {} ({})", e, e.user_message()),
        }
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable consulted when no ipapi key is configured.
pub const IPAPI_KEY_ENV: &str = "DAYBRIEF_IPAPI_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory; settings are stored beneath it
    pub config_dir: PathBuf,

    /// Upstream data sources
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Base URLs for the three upstream providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_location_primary_url")]
    pub location_primary_url: String,

    #[serde(default = "default_location_secondary_url")]
    pub location_secondary_url: String,

    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    #[serde(default = "default_news_url")]
    pub news_url: String,

    /// ipapi.co key for higher rate limits. Falls back to `DAYBRIEF_IPAPI_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipapi_key: Option<String>,
}

fn default_location_primary_url() -> String {
    "https://ipapi.co".to_string()
}

fn default_location_secondary_url() -> String {
    "https://ipwho.is".to_string()
}

fn default_weather_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_news_url() -> String {
    "https://hn.algolia.com".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            location_primary_url: default_location_primary_url(),
            location_secondary_url: default_location_secondary_url(),
            weather_url: default_weather_url(),
            news_url: default_news_url(),
            ipapi_key: None,
        }
    }
}

impl ProviderConfig {
    /// The configured ipapi key, or the one from the environment.
    pub fn effective_ipapi_key(&self) -> Option<String> {
        self.ipapi_key
            .clone()
            .or_else(|| std::env::var(IPAPI_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout. Unset means the transport default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_user_agent() -> String {
    concat!("Daybrief/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daybrief");

        Self {
            config_dir,
            providers: ProviderConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file path, writing defaults if missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let urls = [
            (
                &self.providers.location_primary_url,
                "providers.location_primary_url",
            ),
            (
                &self.providers.location_secondary_url,
                "providers.location_secondary_url",
            ),
            (&self.providers.weather_url, "providers.weather_url"),
            (&self.providers.news_url, "providers.news_url"),
        ];
        for (url, field) in urls {
            Self::validate_url(url, field, &mut result);
        }

        match self.http.timeout_secs {
            Some(0) => result.add_error("http.timeout_secs", "Timeout must be greater than 0"),
            Some(secs) if secs > 120 => result.add_warning(
                "http.timeout_secs",
                "Timeout is unusually long (>120 seconds)",
            ),
            _ => {}
        }

        if self.http.user_agent.trim().is_empty() {
            result.add_warning("http.user_agent", "Empty user agent; some providers reject it");
        }

        if self.providers.effective_ipapi_key().is_none() {
            result.add_warning(
                "providers.ipapi_key",
                "No ipapi key configured - anonymous rate limits apply",
            );
        }

        result
    }

    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Directory holding persisted user settings
    pub fn settings_dir(&self) -> PathBuf {
        self.config_dir.join("settings")
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("daybrief");

        Ok(config_dir.join("config.toml"))
    }
}

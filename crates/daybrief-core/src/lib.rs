pub mod config;
pub mod error;

pub use config::{Config, HttpConfig, ProviderConfig, ValidationResult};
pub use error::{NetworkError, ReqwestErrorExt, StorageError};

use anyhow::Result;

/// Initialize logging for the application. Output goes to stderr so it never
/// mixes with rendered dashboard text.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Daybrief core initialized");
    Ok(())
}

//! Upstream data sources for Daybrief
//!
//! IP geolocation (ipapi.co with ipwho.is fallback), current weather via the
//! Open-Meteo API, and keyword headline search via Hacker News Algolia.

pub mod location;
pub mod news;
pub mod types;
pub mod weather;

pub use location::LocationProvider;
pub use news::NewsProvider;
pub use types::*;
pub use weather::WeatherProvider;

use std::time::Duration;

use daybrief_core::{Config, HttpConfig};
use reqwest::Client;

/// Build the HTTP client shared by all adapters.
pub fn build_client(http: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(http.user_agent.clone());
    if let Some(secs) = http.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

/// The three adapters, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct Providers {
    pub location: LocationProvider,
    pub weather: WeatherProvider,
    pub news: NewsProvider,
}

impl Providers {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_client(&config.http)?;
        let endpoints = &config.providers;

        Ok(Self {
            location: LocationProvider::new(
                client.clone(),
                &endpoints.location_primary_url,
                &endpoints.location_secondary_url,
            )
            .with_api_key(endpoints.effective_ipapi_key()),
            weather: WeatherProvider::new(client.clone(), &endpoints.weather_url),
            news: NewsProvider::new(client, &endpoints.news_url),
        })
    }
}

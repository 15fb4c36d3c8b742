//! IP geolocation with a single fallback.
//!
//! The primary provider is ipapi.co; when it fails for any reason the lookup
//! is repeated once against ipwho.is, which uses a different schema.

use daybrief_core::{NetworkError, ReqwestErrorExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Location, LocationError};

const PRIMARY: &str = "ipapi.co";
const SECONDARY: &str = "ipwho.is";

#[derive(Debug, Deserialize)]
struct IpapiResponse {
    city: Option<String>,
    country_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    region: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpwhoisResponse {
    success: Option<bool>,
    message: Option<String>,
    city: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LocationProvider {
    client: Client,
    primary_url: String,
    secondary_url: String,
    api_key: Option<String>,
}

impl LocationProvider {
    pub fn new(client: Client, primary_url: &str, secondary_url: &str) -> Self {
        Self {
            client,
            primary_url: primary_url.trim_end_matches('/').to_string(),
            secondary_url: secondary_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Append `key=<api_key>` to primary requests.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Resolve the caller's location, falling over to the secondary provider once.
    #[instrument(skip(self), level = "info")]
    pub async fn locate(&self) -> Result<Location, LocationError> {
        match self.fetch_primary().await {
            Ok(location) => Ok(location),
            Err(e) => {
                tracing::info!("{} failed ({}), trying fallback", PRIMARY, e);
                self.fetch_secondary().await.map_err(|e| {
                    tracing::warn!("{} failed: {}", SECONDARY, e);
                    LocationError::AllProvidersFailed(Box::new(e))
                })
            }
        }
    }

    async fn fetch_primary(&self) -> Result<Location, LocationError> {
        let url = format!("{}/json/", self.primary_url);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let body: IpapiResponse = fetch_json(request, PRIMARY).await?;

        if body.error {
            return Err(LocationError::Rejected {
                provider: PRIMARY,
                reason: body.reason.unwrap_or_else(|| "unspecified".to_string()),
            });
        }

        build_location(
            PRIMARY,
            body.city,
            body.country_name,
            body.latitude,
            body.longitude,
            body.region,
        )
    }

    async fn fetch_secondary(&self) -> Result<Location, LocationError> {
        let url = format!("{}/", self.secondary_url);
        let body: IpwhoisResponse = fetch_json(self.client.get(&url), SECONDARY).await?;

        if body.success == Some(false) {
            return Err(LocationError::Rejected {
                provider: SECONDARY,
                reason: body.message.unwrap_or_else(|| "unspecified".to_string()),
            });
        }

        build_location(
            SECONDARY,
            body.city,
            body.country,
            body.latitude,
            body.longitude,
            body.region,
        )
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &'static str,
) -> Result<T, LocationError> {
    let response = request
        .send()
        .await
        .map_err(|e| LocationError::Provider {
            provider,
            source: e.into_network_error(),
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!("{} returned status {}", provider, status);
        return Err(LocationError::Provider {
            provider,
            source: NetworkError::from_status(status),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| LocationError::Provider {
            provider,
            source: e.into_network_error(),
        })
}

fn build_location(
    provider: &'static str,
    city: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    region: Option<String>,
) -> Result<Location, LocationError> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(LocationError::Rejected {
            provider,
            reason: "response has no coordinates".to_string(),
        });
    };

    let location = Location {
        city: city.unwrap_or_default(),
        country: country.unwrap_or_default(),
        latitude,
        longitude,
        region: region.filter(|r| !r.is_empty()),
    };
    tracing::info!(
        "Located via {}: {} ({}, {})",
        provider,
        location.display_name(),
        location.latitude,
        location.longitude
    );
    Ok(location)
}

//! Current conditions from Open-Meteo.

use daybrief_core::ReqwestErrorExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{condition_label, Weather, WeatherError};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: i32,
    time: String,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
}

impl WeatherProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch current conditions at the given coordinates.
    #[instrument(skip(self), level = "info")]
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<Weather, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Weather API returned status {}", status);
            return Err(WeatherError::Api {
                status: status.as_u16(),
            });
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let current = body.current_weather;
        let weather = Weather {
            temperature: round_temperature(current.temperature),
            condition: condition_label(current.weathercode).to_string(),
            wind_speed: current.windspeed,
            wind_direction: current.winddirection,
            weather_code: current.weathercode,
            observation_time: current.time,
        };

        tracing::debug!(
            "Weather: {}°C, {} (code {})",
            weather.temperature,
            weather.condition,
            weather.weather_code
        );
        Ok(weather)
    }
}

/// Round to the nearest degree, halves toward positive infinity.
fn round_temperature(celsius: f64) -> i32 {
    (celsius + 0.5).floor() as i32
}

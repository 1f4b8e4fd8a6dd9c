use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

use crate::{Config, provider::openweather::OpenWeatherProvider};

pub mod openweather;

/// Why a provider call produced no payload.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a structured error instead of data.
    #[error("provider fault: {0}")]
    Fault(String),

    /// Network unreachable, refused or timed out.
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("provider responded with HTTP {status_code}")]
    Http { status_code: u16, body: String },

    /// A 2xx response whose body was not a one-call document.
    #[error("could not decode provider response: {0}")]
    Decode(String),
}

/// Raw "one call" document, in Kelvin.
///
/// Only the envelope is typed. `current` and `daily` stay as JSON so a body
/// with odd or extra entries still reaches the validator, which converts just
/// the fields it uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OneCallResponse {
    #[serde(default)]
    pub current: Value,
    #[serde(default)]
    pub daily: Value,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions and the daily forecast. Called once per
    /// retrieval; no retries.
    async fn fetch_daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        api_key: &str,
    ) -> Result<OneCallResponse, ProviderError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let mut provider = OpenWeatherProvider::new(config.request_timeout())?;
    if let Some(base_url) = config.base_url.as_deref() {
        provider = provider.with_base_url(base_url);
    }
    Ok(Box::new(provider))
}

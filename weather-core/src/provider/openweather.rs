use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{OneCallResponse, ProviderError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const ONE_CALL_PATH: &str = "/data/3.0/onecall";
const EXCLUDE: &str = "minutely,hourly,alerts";

/// Client for the OpenWeather "one call" endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// `timeout` bounds the whole request; exceeding it is a connection failure.
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, ONE_CALL_PATH)
    }
}

/// Error document the provider sends in place of data.
#[derive(Debug, Deserialize)]
struct OwFault {
    cod: serde_json::Value,
    message: String,
}

impl OwFault {
    fn is_fault(&self) -> bool {
        match &self.cod {
            serde_json::Value::Number(n) => n.as_u64() != Some(200),
            serde_json::Value::String(s) => s != "200",
            _ => true,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self, api_key), fields(lat = %latitude, lon = %longitude))]
    async fn fetch_daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        api_key: &str,
    ) -> Result<OneCallResponse, ProviderError> {
        let url = self.endpoint();
        debug!(url = %url, "Requesting one-call forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("exclude", EXCLUDE.to_string()),
                ("appid", api_key.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(ProviderError::Http {
                status_code: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;

        if let Some(fault) =
            serde_json::from_value::<OwFault>(value.clone()).ok().filter(OwFault::is_fault)
        {
            warn!(message = %fault.message, "OpenWeather returned a fault");
            return Err(ProviderError::Fault(fault.message));
        }

        serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

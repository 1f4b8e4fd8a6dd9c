//! Cache-first weather retrieval.
//!
//! A retrieval checks its inputs, serves a cached snapshot when one is
//! present and valid, and otherwise calls the provider once, normalizes the
//! result to Celsius and writes it back to the cache. Corrupt cache entries
//! are logged and overwritten, never returned.

use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use validator::ValidationErrors;

use crate::{
    Config,
    cache::{CacheStore, DEFAULT_CACHE_TTL, cache_key, encode_snapshot},
    model::{PlaceRequest, WeatherDay, WeatherSnapshot},
    place::{PostalCodeFormat, PostalCodeShapes},
    provider::{ProviderError, WeatherProvider, provider_from_config},
    units::kelvin_to_celsius,
    validate::{
        DataError, KelvinDay, ValidForecast, parse_cached_snapshot, validate_provider_payload,
    },
};

/// Why a retrieval produced no snapshot.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A required input was absent; nothing was fetched.
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("invalid place: {0}")]
    InvalidInput(ValidationErrors),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered but its data failed validation; not cached.
    #[error("provider returned unusable data: {0}")]
    InvalidProviderData(#[source] DataError),
}

struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone)]
pub struct RetrieverSettings {
    pub api_key: String,
    pub cache_ttl: Duration,
}

impl RetrieverSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
pub struct WeatherRetriever {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<dyn CacheStore>,
    postal_codes: Arc<dyn PostalCodeFormat>,
    settings: RetrieverSettings,
}

impl WeatherRetriever {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        cache: Arc<dyn CacheStore>,
        settings: RetrieverSettings,
    ) -> Self {
        Self {
            provider,
            cache,
            postal_codes: Arc::new(PostalCodeShapes),
            settings,
        }
    }

    pub fn with_postal_codes(mut self, postal_codes: Arc<dyn PostalCodeFormat>) -> Self {
        self.postal_codes = postal_codes;
        self
    }

    pub async fn retrieve(
        &self,
        request: &PlaceRequest,
    ) -> Result<WeatherSnapshot, RetrievalError> {
        self.retrieve_at(request, Utc::now()).await
    }

    /// Retrieve as if the current time were `now`.
    #[instrument(skip(self, request, now), fields(key = %cache_key(request)))]
    pub async fn retrieve_at(
        &self,
        request: &PlaceRequest,
        now: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, RetrievalError> {
        let coords = self
            .check_inputs(request)
            .inspect_err(|e| warn!(error = %e, "Not retrieving weather"))?;

        request.validate_with(self.postal_codes.as_ref()).map_err(|errors| {
            warn!(errors = %errors, "Place failed validation");
            RetrievalError::InvalidInput(errors)
        })?;

        let key = cache_key(request);
        if let Some(snapshot) = self.read_cache(&key).await {
            return Ok(snapshot);
        }

        let payload = self
            .provider
            .fetch_daily_forecast(coords.latitude, coords.longitude, &self.settings.api_key)
            .await
            .inspect_err(|e| warn!(error = %e, "Weather provider call failed"))?;

        let forecast =
            validate_provider_payload(&payload, now).map_err(RetrievalError::InvalidProviderData)?;

        let snapshot = normalize(forecast, now);
        self.write_cache(&key, &snapshot).await;

        info!("Retrieved fresh weather from provider");
        Ok(snapshot)
    }

    fn check_inputs(&self, request: &PlaceRequest) -> Result<Coordinates, RetrievalError> {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        let latitude = request.latitude.ok_or(RetrievalError::MissingInput("latitude"))?;
        let longitude = request.longitude.ok_or(RetrievalError::MissingInput("longitude"))?;
        if !filled(&request.postal_code) {
            return Err(RetrievalError::MissingInput("postal_code"));
        }
        if !filled(&request.country_code) {
            return Err(RetrievalError::MissingInput("country_code"));
        }
        if self.settings.api_key.trim().is_empty() {
            return Err(RetrievalError::MissingInput("api_key"));
        }

        Ok(Coordinates {
            latitude,
            longitude,
        })
    }

    /// A store error or an invalid entry counts as a miss.
    async fn read_cache(&self, key: &str) -> Option<WeatherSnapshot> {
        let bytes = match self.cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("Cache miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match parse_cached_snapshot(&bytes) {
            Ok(snapshot) => {
                debug!("Cache hit");
                Some(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    /// A failed write is logged; the fresh snapshot is still returned.
    async fn write_cache(&self, key: &str, snapshot: &WeatherSnapshot) {
        let result = match encode_snapshot(snapshot) {
            Ok(bytes) => self.cache.set(key, bytes, self.settings.cache_ttl).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => debug!(
                ttl_secs = self.settings.cache_ttl.as_secs(),
                "Cached weather snapshot"
            ),
            Err(e) => warn!(error = %e, "Failed to cache weather snapshot"),
        }
    }
}

/// Convert a validated Kelvin forecast into a Celsius snapshot.
fn normalize(forecast: ValidForecast, now: DateTime<Utc>) -> WeatherSnapshot {
    let to_celsius = |day: KelvinDay| WeatherDay {
        date: day.date,
        low_celsius: kelvin_to_celsius(day.min),
        high_celsius: kelvin_to_celsius(day.max),
    };

    WeatherSnapshot {
        current_temp_celsius: kelvin_to_celsius(forecast.current_temp),
        downloaded_at: now,
        current_day: to_celsius(forecast.today),
        forecast_days: forecast.forecast.into_iter().map(to_celsius).collect(),
        retrieved_from_cache: false,
    }
}

/// Build a retriever from config: OpenWeather provider, given cache store.
pub fn retriever_from_config(
    config: &Config,
    cache: Arc<dyn CacheStore>,
) -> anyhow::Result<WeatherRetriever> {
    let api_key = config.api_key()?;
    let provider: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(config)?);

    Ok(WeatherRetriever::new(
        provider,
        cache,
        RetrieverSettings::new(api_key).with_cache_ttl(config.cache_ttl()),
    ))
}

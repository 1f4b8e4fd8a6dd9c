//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Place validation (coordinates, country, postal code format)
//! - The OpenWeather provider client
//! - Validation of provider and cached payloads
//! - Cache stores and the cache-first retrieval engine
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod model;
pub mod place;
pub mod provider;
pub mod retriever;
pub mod time;
pub mod units;
pub mod validate;

pub use cache::{CacheStore, FileCacheStore, MemoryCacheStore, cache_key};
pub use config::Config;
pub use model::{PlaceRequest, WeatherDay, WeatherSnapshot};
pub use place::{PostalCodeFormat, PostalCodeShapes};
pub use provider::{ProviderError, WeatherProvider};
pub use retriever::{RetrievalError, RetrieverSettings, WeatherRetriever, retriever_from_config};
pub use units::TempUnit;

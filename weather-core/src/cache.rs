use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;

use crate::model::{PlaceRequest, WeatherSnapshot};

pub mod file;
pub mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;

/// Default lifetime of a cached provider result.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

const KEY_PREFIX: &str = "WEATHER";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache value is not UTF-8")]
    NotUtf8,
}

/// Key-value store with per-entry expiry.
///
/// `set` overwrites unconditionally; concurrent writers for one key are
/// last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

/// `WEATHER/<city>/<state>/<postal code>/<country>`, with absent parts empty.
///
/// Places that differ only in omitted city/state share a slot.
pub fn cache_key(place: &PlaceRequest) -> String {
    let part = |value: &Option<String>| value.as_deref().map(str::trim).unwrap_or("").to_string();

    format!(
        "{KEY_PREFIX}/{}/{}/{}/{}",
        part(&place.city),
        part(&place.state),
        part(&place.postal_code),
        part(&place.country_code),
    )
}

/// Serialize a snapshot into the stored form (Celsius, no cache flag).
pub fn encode_snapshot(snapshot: &WeatherSnapshot) -> Result<Vec<u8>, CacheError> {
    Ok(serde_json::to_vec(snapshot)?)
}

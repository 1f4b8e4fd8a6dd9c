//! In-process cache backed by moka, with per-entry TTL.

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{CacheError, CacheStore};

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    ttl: Duration,
}

/// Each entry lives for the TTL it was written with; overwriting restarts it.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MemoryCacheStore {
    cache: Cache<String, Entry>,
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries).expire_after(EntryTtl).build();
        Self { cache }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let hit = self.cache.get(key).await.map(|entry| entry.bytes);
        debug!(key = %key, hit = hit.is_some(), "Memory cache lookup");
        Ok(hit)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.cache.insert(key.to_string(), Entry { bytes: value, ttl }).await;
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Memory cache write");
        Ok(())
    }
}

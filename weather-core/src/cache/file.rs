//! Cache persisted as a single JSON file, so entries survive between runs of
//! the CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use super::{CacheError, CacheStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

type Entries = HashMap<String, FileEntry>;

#[derive(Debug)]
pub struct FileCacheStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, CacheError> {
        let contents = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable cache file");
                Ok(Entries::new())
            }
        }
    }

    async fn save(&self, entries: &Entries) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(entries)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        let now = Utc::now();

        let hit = entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone().into_bytes());

        debug!(key = %key, hit = hit.is_some(), "File cache lookup");
        Ok(hit)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let value = String::from_utf8(value).map_err(|_| CacheError::NotUtf8)?;
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();

        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.retain(|_, entry| entry.expires_at > now);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        entries.insert(key.to_string(), FileEntry { value, expires_at });
        self.save(&entries).await?;

        debug!(key = %key, path = %self.path.display(), "File cache write");
        Ok(())
    }
}

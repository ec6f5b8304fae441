//! On-disk response cache keyed by location.
//!
//! The whole map lives in a single `cache.json` next to the configuration
//! file. It is loaded once on construction and rewritten wholesale after
//! every mutation. There is no file locking: two processes writing at the
//! same time can clobber each other's entries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

/// File name of the cache, always placed in the directory of the base path.
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Entries older than this many seconds are dropped on every `set`.
pub const SET_PRUNE_AGE_SECS: i64 = 60 * 60;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A cached upstream response together with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub timestamp: DateTime<Utc>,
    pub weather: T,
}

impl<T> CacheEntry<T> {
    pub fn new(weather: T) -> Self {
        Self { timestamp: Utc::now(), weather }
    }

    /// True when the entry is strictly older than `threshold`.
    pub fn is_stale(&self, threshold: Duration) -> bool {
        self.is_stale_at(Utc::now(), threshold)
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now.signed_duration_since(self.timestamp) > threshold
    }
}

#[derive(Debug)]
pub struct Cache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    path: PathBuf,
}

impl<T> Cache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the cache that lives beside `base_path`.
    ///
    /// Only the directory of `base_path` is used. A missing cache file yields
    /// an empty cache; an unreadable or malformed one is an error.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = base_path.as_ref().parent().unwrap_or_else(|| Path::new("."));
        let mut cache = Self { entries: HashMap::new(), path: dir.join(CACHE_FILE_NAME) };
        cache.load()?;
        Ok(cache)
    }

    fn load(&mut self) -> Result<(), CacheError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cache file yet");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        self.entries = serde_json::from_str(&data)?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "loaded cache");
        Ok(())
    }

    fn save(&self) -> Result<(), CacheError> {
        let data = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    pub fn get(&self, location: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(location)
    }

    /// Store a fresh response for `location` and persist the cache.
    ///
    /// Entries older than [`SET_PRUNE_AGE_SECS`] are dropped first. If writing the
    /// file fails the in-memory map keeps the new entry.
    pub fn set(&mut self, location: &str, weather: T) -> Result<(), CacheError> {
        self.prune(Duration::seconds(SET_PRUNE_AGE_SECS));
        self.entries.insert(location.to_owned(), CacheEntry::new(weather));
        self.save()
    }

    /// Drop every entry older than `max_age`, then persist unconditionally.
    pub fn clean(&mut self, max_age: Duration) -> Result<(), CacheError> {
        self.prune(max_age);
        self.save()
    }

    fn prune(&mut self, max_age: Duration) {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_stale_at(now, max_age));

        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "pruned stale cache entries");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

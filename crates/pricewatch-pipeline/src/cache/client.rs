use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{CacheKey, CacheStore, MemoryStore};

/// Outcome of a cache read. Store failures and undecodable entries are
/// both reported as `Miss`.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            CacheLookup::Miss => None,
        }
    }
}

/// Typed JSON view over a [`CacheStore`]. Never propagates cache errors.
#[derive(Debug, Clone)]
pub struct CacheClient {
    store: Arc<dyn CacheStore>,
}

impl CacheClient {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheLookup<T> {
        let raw = match self.store.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!(%key, error = %e, "cache read failed, treating as miss");
                return CacheLookup::Miss;
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => CacheLookup::Hit(value),
            Err(e) => {
                warn!(%key, error = %e, "cached entry could not be decoded, treating as miss");
                CacheLookup::Miss
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%key, error = %e, "value could not be encoded for cache");
                return;
            }
        };

        match self.store.set(key.as_str(), raw, ttl).await {
            Ok(()) => debug!(%key, ttl_ms = ttl.as_millis() as u64, "cached"),
            Err(e) => warn!(%key, error = %e, "cache write failed"),
        }
    }

    /// Returns whether an entry was removed. Failures count as not removed.
    pub async fn remove(&self, key: &CacheKey) -> bool {
        match self.store.delete(key.as_str()).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(%key, error = %e, "cache delete failed");
                false
            }
        }
    }
}

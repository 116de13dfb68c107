/*
[INPUT]:  Cache key, TTL and an async producer of the value
[OUTPUT]: Cached value on hit, freshly computed and stored value on miss
[POS]:    Cache layer - read-through orchestration shared by all pipelines
[UPDATE]: When cache fill or bypass rules change
*/

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::{CacheClient, CacheKey, CacheLookup};

/// Read-through cache: serve from cache, else compute, store and return.
///
/// Failed computations are never cached. Concurrent misses on the same key
/// each compute independently.
#[derive(Debug, Clone)]
pub struct CacheAside {
    cache: CacheClient,
}

impl CacheAside {
    pub fn new(cache: CacheClient) -> Self {
        Self { cache }
    }

    pub fn client(&self) -> &CacheClient {
        &self.cache
    }

    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let CacheLookup::Hit(value) = self.cache.get_json::<T>(key).await {
            debug!(%key, "cache hit");
            return Ok(value);
        }

        debug!(%key, "cache miss");
        let value = compute().await?;
        self.cache.set_json(key, &value, ttl).await;
        Ok(value)
    }
}

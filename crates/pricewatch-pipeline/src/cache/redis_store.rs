use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::{debug, info};

use super::CacheStore;
use crate::error::CacheError;

/// Shared Redis store.
/// Uses a `ConnectionManager` for automatic reconnection. Every command is
/// bounded by `operation_timeout` so a stalled server reads as a miss.
#[derive(Clone)]
pub struct RedisStore {
    conn_manager: ConnectionManager,
    redis_url: String,
    operation_timeout: Duration,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("redis_url", &self.redis_url)
            .field("operation_timeout", &self.operation_timeout)
            .field("conn_manager", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    /// Open a managed connection, failing if the server does not answer
    /// within `connect_timeout`.
    pub async fn connect(
        redis_url: &str,
        connect_timeout: Duration,
        operation_timeout: Duration,
    ) -> Result<Self, CacheError> {
        info!(redis_url, "connecting to redis");
        let client = redis::Client::open(redis_url)?;
        let conn_manager = bounded(connect_timeout, ConnectionManager::new(client)).await?;
        info!(redis_url, "redis connection manager ready");

        Ok(Self {
            conn_manager,
            redis_url: redis_url.to_string(),
            operation_timeout,
        })
    }
}

async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, CacheError>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| CacheError::Timeout(limit))?
        .map_err(CacheError::from)
}

/// Redis expiry has whole-second granularity here; never round down to 0.
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn_manager.clone();
        bounded(self.operation_timeout, conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        let secs = ttl_seconds(ttl);
        bounded(self.operation_timeout, conn.set_ex::<_, _, ()>(key, value, secs)).await?;
        debug!(key, ttl_secs = secs, "redis SETEX");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn_manager.clone();
        let removed: i64 = bounded(self.operation_timeout, conn.del(key)).await?;
        Ok(removed > 0)
    }
}

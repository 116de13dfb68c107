/*
[INPUT]:  String keys, serialized values and a TTL
[OUTPUT]: Shared key-value cache with expiring entries
[POS]:    Cache layer - store backends, key scheme, typed client
[UPDATE]: When adding a backend or changing the key scheme
*/

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

mod client;
mod key;
mod memory;
mod redis_store;

pub use client::{CacheClient, CacheLookup};
pub use key::{CacheKey, Endpoint};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Raw string store with per-entry expiry.
///
/// An expired entry must read back as absent.
#[async_trait]
pub trait CacheStore: Send + Sync + fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Returns whether an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

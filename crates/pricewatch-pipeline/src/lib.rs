/*
[INPUT]:  Public API exports for the pricewatch-pipeline crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod cache;
pub mod cache_aside;
pub mod comparison;
pub mod config;
pub mod error;
pub mod retry;
pub mod runtime;
pub mod service;
pub mod source;
pub mod stats;

// Re-export main types for convenience
pub use cache::{CacheClient, CacheKey, CacheLookup, CacheStore, MemoryStore, RedisStore};
pub use cache_aside::CacheAside;
pub use comparison::ComparisonEngine;
pub use config::AppConfig;
pub use error::{CacheError, ComparisonError, PipelineError, Result};
pub use retry::RetryPolicy;
pub use runtime::Pipelines;
pub use service::{ExchangeService, HealthReport, ServiceSettings};
pub use source::{HttpMarketSource, MarketSource};
pub use stats::{StatsError, calculate_market_stats};

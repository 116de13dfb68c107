/*
[INPUT]:  Built-in defaults, optional YAML file, PRICEWATCH__* environment
[OUTPUT]: Validated application configuration
[POS]:    Configuration layer - process setup
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use pricewatch_adapter::{ClientConfig, Exchange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;
use crate::service::ServiceSettings;

/// Environment variable prefix, e.g. `PRICEWATCH__CACHE__TTL_SECS=5`.
pub const ENV_PREFIX: &str = "PRICEWATCH";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub binance: BinanceConfig,
    pub bybit: BybitConfig,
    pub retry: RetryConfig,
    pub health: HealthConfig,
    pub comparison: ComparisonConfig,
}

/// Outbound HTTP timeouts, shared by adapters and remote sources
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    /// Entry lifetime; market data goes stale quickly
    pub ttl_secs: u64,
    /// Upper bound on a single cache command before it counts as a miss
    pub operation_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            ttl_secs: 2,
            operation_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BinanceConfig {
    pub base_url: String,
    /// Sent as `X-MBX-APIKEY` when present
    pub api_key: Option<String>,
    pub default_depth: u32,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: pricewatch_adapter::exchange::binance::DEFAULT_BINANCE_URL.to_string(),
            api_key: None,
            default_depth: default_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BybitConfig {
    pub base_url: String,
    pub category: String,
    pub default_depth: u32,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: pricewatch_adapter::exchange::bybit::DEFAULT_BYBIT_URL.to_string(),
            category: pricewatch_adapter::exchange::DEFAULT_BYBIT_CATEGORY.to_string(),
            default_depth: default_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    pub canary_symbol: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            canary_symbol: "BTCUSDT".to_string(),
        }
    }
}

/// One side of a comparison. Without `url` the exchange pipeline runs
/// in-process; with it, the pipeline is read from that remote service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceConfig {
    pub exchange: Exchange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub a: SourceConfig,
    pub b: SourceConfig,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            a: SourceConfig {
                exchange: Exchange::Binance,
                url: None,
            },
            b: SourceConfig {
                exchange: Exchange::Bybit,
                url: None,
            },
        }
    }
}

fn default_depth() -> u32 {
    30
}

impl AppConfig {
    /// Load defaults, then `path` (YAML) if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document on top of the defaults, without the environment.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cache.ttl_secs == 0 {
            return Err(SettingsError::Invalid("cache.ttl_secs must be positive".to_string()));
        }
        if self.cache.operation_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "cache.operation_timeout_ms must be positive".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(SettingsError::Invalid("http.timeout_secs must be positive".to_string()));
        }
        for (exchange, depth) in [
            (Exchange::Binance, self.binance.default_depth),
            (Exchange::Bybit, self.bybit.default_depth),
        ] {
            let limits = exchange.depth_limits();
            if !limits.contains(&depth) {
                return Err(SettingsError::Invalid(format!(
                    "{exchange}.default_depth must be between {} and {}, got {depth}",
                    limits.start(),
                    limits.end()
                )));
            }
        }
        if self.comparison.a == self.comparison.b {
            return Err(SettingsError::Invalid(
                "comparison.a and comparison.b must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.initial_backoff_ms),
        )
    }

    pub fn service_settings(&self, exchange: Exchange) -> ServiceSettings {
        let default_depth = match exchange {
            Exchange::Binance => self.binance.default_depth,
            Exchange::Bybit => self.bybit.default_depth,
        };
        ServiceSettings {
            cache_ttl: Duration::from_secs(self.cache.ttl_secs),
            default_depth,
            canary_symbol: self.health.canary_symbol.clone(),
        }
    }

    /// Effective configuration as YAML, with secrets masked.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let mut shown = self.clone();
        if shown.binance.api_key.is_some() {
            shown.binance.api_key = Some("***".to_string());
        }
        serde_yaml::to_string(&shown)
    }
}

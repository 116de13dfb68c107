/*
[INPUT]:  Validated AppConfig
[OUTPUT]: Shared cache, per-exchange services and the comparison engine
[POS]:    Composition root - builds every component once at startup
[UPDATE]: When adding exchanges, cache backends or source kinds
*/

use std::sync::Arc;
use std::time::Duration;

use pricewatch_adapter::{BinanceAdapter, BybitAdapter, Exchange, ExchangeAdapter};
use tracing::{info, warn};

use crate::cache::{CacheClient, RedisStore};
use crate::comparison::ComparisonEngine;
use crate::config::{AppConfig, CacheBackend, CacheConfig, SourceConfig};
use crate::error::Result;
use crate::service::ExchangeService;
use crate::source::{HttpMarketSource, MarketSource};

/// Open the configured cache. An unreachable Redis degrades to the
/// in-memory store instead of failing startup.
pub async fn connect_cache(config: &CacheConfig, connect_timeout: Duration) -> CacheClient {
    match config.backend {
        CacheBackend::Memory => {
            info!("using in-memory cache");
            CacheClient::in_memory()
        }
        CacheBackend::Redis => match RedisStore::connect(
            &config.redis_url,
            connect_timeout,
            Duration::from_millis(config.operation_timeout_ms),
        )
        .await
        {
            Ok(store) => CacheClient::new(Arc::new(store)),
            Err(e) => {
                warn!(
                    redis_url = %config.redis_url,
                    error = %e,
                    "redis unavailable, falling back to in-memory cache"
                );
                CacheClient::in_memory()
            }
        },
    }
}

pub fn build_adapter(config: &AppConfig, exchange: Exchange) -> Result<Arc<dyn ExchangeAdapter>> {
    let client_config = config.client_config();
    let adapter: Arc<dyn ExchangeAdapter> = match exchange {
        Exchange::Binance => Arc::new(BinanceAdapter::new(
            client_config,
            &config.binance.base_url,
            config.binance.api_key.as_deref(),
        )?),
        Exchange::Bybit => Arc::new(BybitAdapter::new(
            client_config,
            &config.bybit.base_url,
            &config.bybit.category,
        )?),
    };
    Ok(adapter)
}

/// One service per exchange, all sharing a single cache.
#[derive(Debug, Clone)]
pub struct Pipelines {
    binance: ExchangeService,
    bybit: ExchangeService,
}

impl Pipelines {
    pub fn new(config: &AppConfig, cache: CacheClient) -> Result<Self> {
        let service = |exchange: Exchange| -> Result<ExchangeService> {
            Ok(ExchangeService::new(
                build_adapter(config, exchange)?,
                cache.clone(),
                config.retry_policy(),
                config.service_settings(exchange),
            ))
        };

        Ok(Self {
            binance: service(Exchange::Binance)?,
            bybit: service(Exchange::Bybit)?,
        })
    }

    pub fn service(&self, exchange: Exchange) -> &ExchangeService {
        match exchange {
            Exchange::Binance => &self.binance,
            Exchange::Bybit => &self.bybit,
        }
    }

    /// Comparison engine over the configured sides: in-process services,
    /// or remote pipelines where a URL is configured.
    pub fn comparison_engine(&self, config: &AppConfig) -> Result<ComparisonEngine> {
        let timeout = Duration::from_secs(config.http.timeout_secs);
        let source_a = self.source(&config.comparison.a, timeout)?;
        let source_b = self.source(&config.comparison.b, timeout)?;
        Ok(ComparisonEngine::new(source_a, source_b))
    }

    fn source(&self, side: &SourceConfig, timeout: Duration) -> Result<Arc<dyn MarketSource>> {
        let source: Arc<dyn MarketSource> = match &side.url {
            Some(url) => Arc::new(HttpMarketSource::for_exchange(side.exchange, url, timeout)?),
            None => Arc::new(self.service(side.exchange).clone()),
        };
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, Endpoint};

    #[tokio::test]
    async fn unreachable_redis_falls_back_to_memory() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            redis_url: "redis://127.0.0.1:9".to_string(),
            ttl_secs: 2,
            ..CacheConfig::default()
        };

        let cache = connect_cache(&config, Duration::from_millis(500)).await;

        let key = CacheKey::new(Exchange::Binance, Endpoint::Price, "BTCUSDT");
        cache.set_json(&key, &1u32, Duration::from_secs(2)).await;
        assert_eq!(cache.get_json::<u32>(&key).await.into_option(), Some(1));
    }

    #[test]
    fn services_follow_configured_exchanges() {
        let config = AppConfig::default();
        let pipelines = Pipelines::new(&config, CacheClient::in_memory()).expect("pipelines");

        assert_eq!(pipelines.service(Exchange::Binance).exchange(), Exchange::Binance);
        assert_eq!(pipelines.service(Exchange::Bybit).exchange(), Exchange::Bybit);
        assert!(pipelines.comparison_engine(&config).is_ok());
    }

    #[test]
    fn bad_base_url_fails_construction() {
        let mut config = AppConfig::default();
        config.bybit.base_url = "not a url".to_string();

        assert!(Pipelines::new(&config, CacheClient::in_memory()).is_err());
    }
}

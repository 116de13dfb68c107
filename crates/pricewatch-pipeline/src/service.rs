/*
[INPUT]:  An exchange adapter, shared cache, retry policy and settings
[OUTPUT]: Cached price, order book, market stats, health and invalidation
[POS]:    Pipeline layer - per-exchange service composing adapter + cache
[UPDATE]: When adding pipeline operations or changing cache keys/TTLs
*/

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pricewatch_adapter::{
    DepthRequest, Exchange, ExchangeAdapter, MarketStats, OrderBook, normalize_symbol,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheClient, CacheKey, Endpoint};
use crate::cache_aside::CacheAside;
use crate::error::{PipelineError, Result};
use crate::retry::RetryPolicy;
use crate::stats::calculate_market_stats;

/// Tunables of one exchange pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub cache_ttl: Duration,
    /// Depth fetched when deriving market stats.
    pub default_depth: u32,
    /// Symbol priced by the health probe.
    pub canary_symbol: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(2),
            default_depth: 30,
            canary_symbol: "BTCUSDT".to_string(),
        }
    }
}

/// Result of a health probe. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub exchange: Exchange,
    pub healthy: bool,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

/// Cached request pipeline for a single exchange.
#[derive(Debug, Clone)]
pub struct ExchangeService {
    adapter: Arc<dyn ExchangeAdapter>,
    cache: CacheAside,
    retry: RetryPolicy,
    settings: ServiceSettings,
}

impl ExchangeService {
    pub fn new(
        adapter: Arc<dyn ExchangeAdapter>,
        cache: CacheClient,
        retry: RetryPolicy,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            adapter,
            cache: CacheAside::new(cache),
            retry,
            settings,
        }
    }

    pub fn exchange(&self) -> Exchange {
        self.adapter.exchange()
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Last traded price, served from cache within the TTL.
    #[instrument(skip(self), fields(exchange = %self.exchange()))]
    pub async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        let symbol = normalize_symbol(symbol)?;
        let key = CacheKey::new(self.exchange(), Endpoint::Price, &symbol);

        self.cache
            .get_or_compute(&key, self.settings.cache_ttl, || async {
                debug!(%symbol, "fetching price from exchange");
                self.adapter
                    .get_price(&symbol)
                    .await
                    .map_err(PipelineError::from)
            })
            .await
    }

    /// Order book snapshot. The limit is validated before the cache is
    /// consulted, so an invalid request never produces a hit.
    #[instrument(skip(self), fields(exchange = %self.exchange()))]
    pub async fn get_order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook> {
        let request = DepthRequest::new(symbol, limit, self.adapter.depth_limits())?;
        let key = CacheKey::new(self.exchange(), Endpoint::OrderBook, &request.symbol)
            .with_param(request.limit);

        self.cache
            .get_or_compute(&key, self.settings.cache_ttl, || async {
                debug!(symbol = %request.symbol, limit = request.limit, "fetching order book from exchange");
                self.adapter
                    .get_order_book(&request.symbol, request.limit)
                    .await
                    .map_err(PipelineError::from)
            })
            .await
    }

    /// Market stats derived from the cached price and order book, fetched
    /// concurrently. The derived value gets its own cache entry.
    #[instrument(skip(self), fields(exchange = %self.exchange()))]
    pub async fn get_market_stats(&self, symbol: &str) -> Result<MarketStats> {
        let symbol = normalize_symbol(symbol)?;
        let key = CacheKey::new(self.exchange(), Endpoint::MarketStats, &symbol);

        self.cache
            .get_or_compute(&key, self.settings.cache_ttl, || {
                self.compute_market_stats(&symbol)
            })
            .await
    }

    async fn compute_market_stats(&self, symbol: &str) -> Result<MarketStats> {
        let (price, book) = tokio::try_join!(
            self.get_price(symbol),
            self.get_order_book(symbol, self.settings.default_depth)
        )?;

        calculate_market_stats(symbol, price, &book).map_err(|source| PipelineError::Stats {
            symbol: symbol.to_string(),
            source,
        })
    }

    /// [`get_market_stats`](Self::get_market_stats) under the retry policy,
    /// with `max_attempts` overriding the configured budget.
    pub async fn get_market_stats_with_retry(
        &self,
        symbol: &str,
        max_attempts: Option<u32>,
    ) -> Result<MarketStats> {
        let symbol = normalize_symbol(symbol)?;
        let symbol = symbol.as_str();
        let policy = match max_attempts {
            Some(max_attempts) => self.retry.with_max_attempts(max_attempts),
            None => self.retry,
        };

        policy
            .run("market_stats", |attempt| {
                debug!(exchange = %self.exchange(), symbol, attempt, "market stats attempt");
                self.get_market_stats(symbol)
            })
            .await
    }

    /// Healthy iff the canary symbol prices strictly above zero.
    pub async fn health_probe(&self) -> HealthReport {
        let symbol = self.settings.canary_symbol.clone();
        let (healthy, price, message) = match self.get_price(&symbol).await {
            Ok(price) if price > Decimal::ZERO => (true, Some(price), "ok".to_string()),
            Ok(price) => (
                false,
                Some(price),
                format!("{symbol} priced at {price}, expected a positive price"),
            ),
            Err(e) => {
                warn!(exchange = %self.exchange(), error = %e, "health probe failed");
                (false, None, e.to_string())
            }
        };

        HealthReport {
            exchange: self.exchange(),
            healthy,
            symbol,
            price,
            message,
            checked_at: Utc::now(),
        }
    }

    /// Drop the cached price and market stats for `symbol`, plus the order
    /// book at the default depth. Returns how many entries were removed.
    pub async fn invalidate(&self, symbol: &str) -> Result<usize> {
        let symbol = normalize_symbol(symbol)?;
        let exchange = self.exchange();
        let keys = [
            CacheKey::new(exchange, Endpoint::Price, &symbol),
            CacheKey::new(exchange, Endpoint::OrderBook, &symbol)
                .with_param(self.settings.default_depth),
            CacheKey::new(exchange, Endpoint::MarketStats, &symbol),
        ];

        let mut removed = 0;
        for key in &keys {
            if self.cache.client().remove(key).await {
                removed += 1;
            }
        }
        info!(%exchange, %symbol, removed, "cache invalidated");
        Ok(removed)
    }
}

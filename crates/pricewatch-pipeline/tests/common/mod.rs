/*
[INPUT]:  Test scenarios needing fake adapters, stores and remote pipelines
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for pricewatch-pipeline tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pricewatch_adapter::{Exchange, ExchangeAdapter, ExchangeError, OrderBook, RawLevel, UpstreamError};
use pricewatch_pipeline::{
    CacheClient, CacheError, CacheStore, ExchangeService, RetryPolicy, ServiceSettings,
};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Adapter returning a fixed quote, failing the first `failures` price calls.
/// Each call waits `latency` on the Tokio clock before answering.
#[derive(Debug)]
pub struct CountingAdapter {
    exchange: Exchange,
    price: Decimal,
    failures: usize,
    latency: Duration,
    pub price_calls: AtomicUsize,
    pub book_calls: AtomicUsize,
}

impl CountingAdapter {
    pub fn new(exchange: Exchange, price: &str) -> Self {
        Self {
            exchange,
            price: price.parse().expect("decimal price"),
            failures: 0,
            latency: Duration::ZERO,
            price_calls: AtomicUsize::new(0),
            book_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    pub fn book_calls(&self) -> usize {
        self.book_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeAdapter for CountingAdapter {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    async fn get_price(&self, symbol: &str) -> pricewatch_adapter::Result<Decimal> {
        let call = self.price_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        if call < self.failures {
            return Err(ExchangeError::api(
                self.exchange,
                symbol,
                UpstreamError::status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "try later"),
            ));
        }
        Ok(self.price)
    }

    async fn get_order_book(&self, _symbol: &str, _limit: u32) -> pricewatch_adapter::Result<OrderBook> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        Ok(OrderBook {
            bids: vec![RawLevel::new("99.5", "2"), RawLevel::new("99.0", "1")],
            asks: vec![RawLevel::new("100.5", "1"), RawLevel::new("101.0", "3")],
            last_update_id: Some(7),
        })
    }
}

/// Store whose every operation fails, standing in for a dead Redis.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Timeout(Duration::from_millis(10)))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_millis(10)))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Timeout(Duration::from_millis(10)))
    }
}

/// Service over `adapter` with an in-memory cache and default settings.
pub fn service_for(adapter: Arc<dyn ExchangeAdapter>) -> ExchangeService {
    ExchangeService::new(
        adapter,
        CacheClient::in_memory(),
        RetryPolicy::default(),
        ServiceSettings::default(),
    )
}

/// Mount a Binance depth response with the given levels
pub async fn mount_binance_depth(server: &MockServer, bids: serde_json::Value, asks: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v3/depth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lastUpdateId": 1027024,
            "bids": bids,
            "asks": asks,
        })))
        .mount(server)
        .await;
}

/// Mount a successful `ApiResponse` for a remote pipeline route
pub async fn mount_remote(server: &MockServer, route: &str, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": data,
            "error": null,
            "timestamp": "2024-05-01T12:00:00Z",
        })))
        .mount(server)
        .await;
}

/// Mount a failed `ApiResponse` for a remote pipeline route
pub async fn mount_remote_failure(server: &MockServer, route: &str, message: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "data": null,
            "error": message,
            "timestamp": "2024-05-01T12:00:00Z",
        })))
        .mount(server)
        .await;
}

/// Market stats JSON as served by a remote pipeline
pub fn stats_json(symbol: &str, price: &str) -> serde_json::Value {
    json!({
        "symbol": symbol,
        "currentPrice": price,
        "bestBidPrice": price,
        "bestAskPrice": price,
        "spread": "0",
        "spreadPercentage": "0",
        "topBids": [{"price": price, "quantity": "1"}],
        "topAsks": [{"price": price, "quantity": "1"}],
        "bidVolume": price,
        "askVolume": price,
        "timestamp": "2024-05-01T12:00:00Z",
    })
}

/*
[INPUT]:  Normalized exchange data and serde requirements
[OUTPUT]: Canonical market model shared by adapters, cache and comparison
[POS]:    Data layer - exchange-independent value objects
[UPDATE]: When the canonical model gains fields
*/

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One raw `[price, quantity]` level exactly as the exchange encoded it.
///
/// Numbers stay as strings until statistics are derived so no precision is
/// lost on the way through the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLevel(pub String, pub String);

impl RawLevel {
    pub fn new(price: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self(price.into(), quantity.into())
    }

    pub fn price(&self) -> &str {
        &self.0
    }

    pub fn quantity(&self) -> &str {
        &self.1
    }
}

/// Order book snapshot in exchange wire form.
///
/// Bids are descending and asks ascending by exchange convention, but
/// consumers must not rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookEntry {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderBookEntry {
    /// `price * quantity`, `None` when the product leaves the decimal range.
    pub fn volume(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

/// Statistics derived from a price and an order book.
///
/// `spread` and `spread_percentage` are fixed at construction time, the
/// value is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    pub symbol: String,
    pub current_price: Decimal,
    pub best_bid_price: Decimal,
    pub best_ask_price: Decimal,
    pub spread: Decimal,
    pub spread_percentage: Decimal,
    pub top_bids: Vec<OrderBookEntry>,
    pub top_asks: Vec<OrderBookEntry>,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Cross-exchange comparison of two named sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub symbol: String,
    pub exchange_a: String,
    pub exchange_b: String,
    pub price_a: Decimal,
    pub price_b: Decimal,
    pub difference_absolute: Decimal,
    pub difference_percentage: Decimal,
    pub recommended_exchange: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_a: Option<MarketStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_b: Option<MarketStats>,
    pub timestamp: DateTime<Utc>,
}

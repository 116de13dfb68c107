/*
[INPUT]:  Symbol and depth requests from the pipeline
[OUTPUT]: Canonical prices and order books per exchange
[POS]:    Adapter layer - one implementation per exchange behind a shared trait
[UPDATE]: When adding an exchange or changing the adapter contract
*/

use std::ops::RangeInclusive;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::http::{Result, UpstreamError};
use crate::types::{Exchange, OrderBook};

pub mod binance;
pub mod bybit;

pub use binance::BinanceAdapter;
pub use bybit::{BybitAdapter, DEFAULT_BYBIT_CATEGORY};

/// Translates one exchange's public REST API into the canonical model.
///
/// Implementations never return a zero price in place of a failure.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync + std::fmt::Debug {
    fn exchange(&self) -> Exchange;

    /// Depth limits accepted by `get_order_book`.
    fn depth_limits(&self) -> RangeInclusive<u32> {
        self.exchange().depth_limits()
    }

    /// Last traded price for `symbol`.
    async fn get_price(&self, symbol: &str) -> Result<Decimal>;

    /// Order book snapshot with at most `limit` levels per side.
    async fn get_order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook>;
}

pub(crate) fn parse_decimal(
    field: &'static str,
    value: &str,
) -> std::result::Result<Decimal, UpstreamError> {
    Decimal::from_str(value.trim())
        .or_else(|_| Decimal::from_scientific(value.trim()))
        .map_err(|_| UpstreamError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

pub(crate) fn ensure_valid(book: &OrderBook) -> std::result::Result<(), UpstreamError> {
    if book.bids.is_empty() {
        return Err(UpstreamError::InvalidOrderBook("no bids".to_string()));
    }
    if book.asks.is_empty() {
        return Err(UpstreamError::InvalidOrderBook("no asks".to_string()));
    }
    Ok(())
}

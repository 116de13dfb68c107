/*
[INPUT]:  Symbol, current price and a raw order book
[OUTPUT]: MarketStats (best bid/ask, spread, top-of-book depth, volumes)
[POS]:    Statistics layer - pure, deterministic derivation, no I/O
[UPDATE]: When the derived statistics or depth window change
*/

use std::cmp::Reverse;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pricewatch_adapter::{BookSide, MarketStats, OrderBook, OrderBookEntry, RawLevel};
use rust_decimal::Decimal;
use thiserror::Error;

/// Number of levels per side kept as "top" entries.
pub const TOP_LEVELS: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("invalid {side} {field} at level {index}: '{value}'")]
    InvalidNumber {
        side: BookSide,
        field: &'static str,
        index: usize,
        value: String,
    },

    #[error("{field} is outside the decimal range")]
    Overflow { field: &'static str },
}

/// Derive market statistics, stamped with the current time.
pub fn calculate_market_stats(
    symbol: &str,
    current_price: Decimal,
    book: &OrderBook,
) -> Result<MarketStats, StatsError> {
    calculate_market_stats_at(symbol, current_price, book, Utc::now())
}

/// Same as [`calculate_market_stats`] with an explicit timestamp.
pub fn calculate_market_stats_at(
    symbol: &str,
    current_price: Decimal,
    book: &OrderBook,
    timestamp: DateTime<Utc>,
) -> Result<MarketStats, StatsError> {
    let mut bids = parse_levels(&book.bids, BookSide::Bid)?;
    bids.sort_by_key(|entry| Reverse(entry.price));
    bids.truncate(TOP_LEVELS);

    let mut asks = parse_levels(&book.asks, BookSide::Ask)?;
    asks.sort_by_key(|entry| entry.price);
    asks.truncate(TOP_LEVELS);

    let best_bid_price = bids.first().map(|e| e.price).unwrap_or(Decimal::ZERO);
    let best_ask_price = asks.first().map(|e| e.price).unwrap_or(Decimal::ZERO);

    let spread = if best_bid_price > Decimal::ZERO && best_ask_price > Decimal::ZERO {
        best_ask_price - best_bid_price
    } else {
        Decimal::ZERO
    };
    let spread_percentage = if current_price > Decimal::ZERO {
        spread
            .checked_div(current_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(StatsError::Overflow {
                field: "spread_percentage",
            })?
    } else {
        Decimal::ZERO
    };
    let bid_volume = side_volume(&bids, "bid_volume")?;
    let ask_volume = side_volume(&asks, "ask_volume")?;

    Ok(MarketStats {
        symbol: symbol.to_string(),
        current_price,
        best_bid_price,
        best_ask_price,
        spread,
        spread_percentage,
        bid_volume,
        ask_volume,
        top_bids: bids,
        top_asks: asks,
        timestamp,
    })
}

fn side_volume(entries: &[OrderBookEntry], field: &'static str) -> Result<Decimal, StatsError> {
    entries
        .iter()
        .try_fold(Decimal::ZERO, |total, entry| {
            entry.volume().and_then(|volume| total.checked_add(volume))
        })
        .ok_or(StatsError::Overflow { field })
}

fn parse_levels(levels: &[RawLevel], side: BookSide) -> Result<Vec<OrderBookEntry>, StatsError> {
    levels
        .iter()
        .enumerate()
        .map(|(index, level)| {
            Ok(OrderBookEntry {
                price: parse_number(side, "price", index, level.price())?,
                quantity: parse_number(side, "quantity", index, level.quantity())?,
            })
        })
        .collect()
}

fn parse_number(
    side: BookSide,
    field: &'static str,
    index: usize,
    value: &str,
) -> Result<Decimal, StatsError> {
    Decimal::from_str(value.trim()).map_err(|_| StatsError::InvalidNumber {
        side,
        field,
        index,
        value: value.to_string(),
    })
}

/*
[INPUT]:  Exchange identifiers from config, CLI and cache keys
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions shared by every exchange
[UPDATE]: When adding a new exchange
*/

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
}

impl Exchange {
    /// Lowercase name used in cache keys and remote routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
        }
    }

    /// Order book depth accepted by the exchange's public depth endpoint.
    pub fn depth_limits(&self) -> RangeInclusive<u32> {
        match self {
            Exchange::Binance => 5..=1000,
            Exchange::Bybit => 1..=200,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::Bybit),
            other => Err(format!("unknown exchange '{other}', expected binance or bybit")),
        }
    }
}

/// Side of the order book a level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Bid,
    Ask,
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookSide::Bid => f.write_str("bid"),
            BookSide::Ask => f.write_str("ask"),
        }
    }
}

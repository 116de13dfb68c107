use std::fmt;

use pricewatch_adapter::Exchange;

/// Cached data kinds, one per adapter operation plus derived stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Price,
    OrderBook,
    MarketStats,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Price => "price",
            Endpoint::OrderBook => "orderbook",
            Endpoint::MarketStats => "marketstats",
        }
    }
}

/// Cache key of the form `{exchange}:{endpoint}:{SYMBOL}[:{param}]`.
///
/// The symbol is always stored upper-case so differently-cased requests
/// share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(exchange: Exchange, endpoint: Endpoint, symbol: &str) -> Self {
        Self(format!(
            "{}:{}:{}",
            exchange.as_str(),
            endpoint.as_str(),
            symbol.trim().to_ascii_uppercase()
        ))
    }

    /// Append a discriminating parameter such as the depth limit.
    pub fn with_param(mut self, param: impl fmt::Display) -> Self {
        self.0.push(':');
        self.0.push_str(&param.to_string());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_matches_scheme() {
        assert_eq!(
            CacheKey::new(Exchange::Binance, Endpoint::Price, "BTCUSDT").as_str(),
            "binance:price:BTCUSDT"
        );
        assert_eq!(
            CacheKey::new(Exchange::Bybit, Endpoint::OrderBook, "ETHUSDT")
                .with_param(50)
                .as_str(),
            "bybit:orderbook:ETHUSDT:50"
        );
        assert_eq!(
            CacheKey::new(Exchange::Binance, Endpoint::MarketStats, "SOLUSDT").to_string(),
            "binance:marketstats:SOLUSDT"
        );
    }

    #[test]
    fn symbol_case_does_not_split_entries() {
        assert_eq!(
            CacheKey::new(Exchange::Binance, Endpoint::Price, "btcusdt"),
            CacheKey::new(Exchange::Binance, Endpoint::Price, "BTCUSDT")
        );
    }

    #[test]
    fn exchanges_never_share_keys() {
        assert_ne!(
            CacheKey::new(Exchange::Binance, Endpoint::Price, "BTCUSDT"),
            CacheKey::new(Exchange::Bybit, Endpoint::Price, "BTCUSDT")
        );
    }
}

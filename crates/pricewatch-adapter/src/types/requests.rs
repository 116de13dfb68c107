/*
[INPUT]:  Caller-supplied symbol and depth parameters
[OUTPUT]: Validated, normalized request values
[POS]:    Data layer - input validation before any network call
[UPDATE]: When request parameters or their bounds change
*/

use std::ops::RangeInclusive;

use crate::http::{ExchangeError, Result};

/// Trim and upper-case a trading symbol, rejecting empty input.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ExchangeError::validation("symbol", "symbol must not be empty"));
    }
    Ok(symbol.to_ascii_uppercase())
}

/// Parameters of an order book depth query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthRequest {
    pub symbol: String,
    pub limit: u32,
}

impl DepthRequest {
    pub fn new(symbol: &str, limit: u32, accepted: RangeInclusive<u32>) -> Result<Self> {
        let symbol = normalize_symbol(symbol)?;
        if !accepted.contains(&limit) {
            return Err(ExchangeError::validation(
                "limit",
                format!(
                    "limit must be between {} and {}, got {}",
                    accepted.start(),
                    accepted.end(),
                    limit
                ),
            ));
        }
        Ok(Self { symbol, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn symbol_is_trimmed_and_uppercased() {
        assert_eq!(normalize_symbol(" btcusdt ").expect("symbol"), "BTCUSDT");
    }

    #[test]
    fn empty_symbol_is_rejected() {
        let err = normalize_symbol("   ").expect_err("empty symbol");
        assert!(err.is_validation());
    }

    #[rstest]
    #[case(5, true)]
    #[case(1000, true)]
    #[case(4, false)]
    #[case(1001, false)]
    fn depth_limit_respects_range(#[case] limit: u32, #[case] accepted: bool) {
        let request = DepthRequest::new("ethusdt", limit, 5..=1000);
        assert_eq!(request.is_ok(), accepted);
        if let Ok(request) = request {
            assert_eq!(request.symbol, "ETHUSDT");
        }
    }
}

/*
[INPUT]:  Error sources (validation, HTTP, exchange envelopes, serialization)
[OUTPUT]: Structured error types with exchange/symbol context
[POS]:    Error handling layer - unified error types for the adapter crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::Exchange;

/// Why a single upstream call did not yield usable data.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Exchange envelope carried a non-success code
    #[error("exchange returned code {code}: {message}")]
    Envelope { code: i64, message: String },

    /// Body did not match the expected schema
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid number in {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid order book: {0}")]
    InvalidOrderBook(String),
}

impl UpstreamError {
    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        UpstreamError::Status {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Http(err) if err.is_timeout())
    }
}

/// Main error type for exchange adapters
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Caller-supplied parameter rejected before any network call
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Exchange API call failed or returned unusable data
    #[error("{exchange} API error for {symbol}: {source}")]
    Api {
        exchange: Exchange,
        symbol: String,
        #[source]
        source: UpstreamError,
    },

    /// Client could not be constructed
    #[error("configuration error: {0}")]
    Config(String),
}

impl ExchangeError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ExchangeError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn api(exchange: Exchange, symbol: impl Into<String>, source: UpstreamError) -> Self {
        ExchangeError::Api {
            exchange,
            symbol: symbol.into(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ExchangeError::Validation { .. })
    }
}

impl From<url::ParseError> for ExchangeError {
    fn from(err: url::ParseError) -> Self {
        ExchangeError::Config(format!("invalid URL: {err}"))
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let status_err = ExchangeError::api(
            Exchange::Binance,
            "BTCUSDT",
            UpstreamError::status(StatusCode::BAD_GATEWAY, "bad gateway"),
        );
        assert!(!status_err.is_validation());
        assert_eq!(
            status_err.to_string(),
            "binance API error for BTCUSDT: unexpected HTTP status 502: bad gateway"
        );

        let validation = ExchangeError::validation("limit", "out of range");
        assert!(validation.is_validation());
    }

    #[test]
    fn test_api_error_message_names_exchange_and_symbol() {
        let err = ExchangeError::api(
            Exchange::Bybit,
            "ETHUSDT",
            UpstreamError::Envelope {
                code: 10001,
                message: "Not supported symbols".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "bybit API error for ETHUSDT: exchange returned code 10001: Not supported symbols"
        );
    }
}

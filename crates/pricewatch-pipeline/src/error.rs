/*
[INPUT]:  Adapter, statistics, cache and comparison failures
[OUTPUT]: Typed pipeline errors surfaced to the request boundary
[POS]:    Error handling layer - unified error types for the pipeline crate
[UPDATE]: When adding new error sources or improving error messages
*/

use std::time::Duration;

use pricewatch_adapter::ExchangeError;
use thiserror::Error;

use crate::stats::StatsError;

/// Failure talking to the shared cache. Never leaves the cache client.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of one side of a comparison, named after the failing source.
#[derive(Error, Debug)]
pub enum ComparisonError {
    /// Upstream answered but reported failure
    #[error("{source_name} reported failure: {message}")]
    Rejected { source_name: String, message: String },

    /// Upstream could not be reached
    #[error("{source_name} transport failure: {error}")]
    Transport {
        source_name: String,
        #[source]
        error: reqwest::Error,
    },

    /// Upstream answered with a non-success status and no envelope
    #[error("{source_name} returned HTTP status {status}")]
    Status { source_name: String, status: u16 },

    /// Upstream answered with a body that is not an `ApiResponse`
    #[error("{source_name} returned malformed data: {error}")]
    Malformed {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },

    #[error("{source_name} has an invalid URL: {error}")]
    InvalidUrl {
        source_name: String,
        #[source]
        error: url::ParseError,
    },

    /// Quote cannot be compared against the other side within decimal range
    #[error("{source_name} price {price} is out of range against the baseline")]
    OutOfRange { source_name: String, price: String },

    /// In-process pipeline failed
    #[error("{source_name} pipeline failed: {error}")]
    Pipeline {
        source_name: String,
        #[source]
        error: Box<PipelineError>,
    },
}

impl ComparisonError {
    /// Name of the source that failed.
    pub fn source_name(&self) -> &str {
        match self {
            ComparisonError::Rejected { source_name, .. }
            | ComparisonError::Transport { source_name, .. }
            | ComparisonError::Status { source_name, .. }
            | ComparisonError::Malformed { source_name, .. }
            | ComparisonError::InvalidUrl { source_name, .. }
            | ComparisonError::OutOfRange { source_name, .. }
            | ComparisonError::Pipeline { source_name, .. } => source_name,
        }
    }

    /// Whether the upstream answered and indicated failure, as opposed to
    /// not being reachable at all.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ComparisonError::Rejected { .. })
    }
}

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Validation or exchange API failure from an adapter
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("failed to derive market stats for {symbol}: {source}")]
    Stats {
        symbol: String,
        #[source]
        source: StatsError,
    },

    #[error("comparison failed: {0}")]
    Comparison(#[from] ComparisonError),

    #[error("all {attempts} attempts failed, last error: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Exchange(err) if err.is_validation())
    }

    /// The innermost error once retry wrapping is peeled off.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::RetryExhausted { last, .. } => last.root(),
            other => other,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_adapter::{Exchange, UpstreamError};

    #[test]
    fn retry_exhausted_exposes_root_cause() {
        let inner = PipelineError::from(ExchangeError::api(
            Exchange::Binance,
            "BTCUSDT",
            UpstreamError::MissingField("price"),
        ));
        let err = PipelineError::RetryExhausted {
            attempts: 3,
            last: Box::new(inner),
        };

        assert!(matches!(err.root(), PipelineError::Exchange(ExchangeError::Api { .. })));
        assert_eq!(
            err.to_string(),
            "all 3 attempts failed, last error: binance API error for BTCUSDT: missing field: price"
        );
    }

    #[test]
    fn comparison_error_names_side() {
        let err = ComparisonError::Rejected {
            source_name: "bybit".to_string(),
            message: "service unavailable".to_string(),
        };
        assert_eq!(err.source_name(), "bybit");
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "bybit reported failure: service unavailable");
    }

    #[test]
    fn validation_is_detected_through_wrapper() {
        let err = PipelineError::from(ExchangeError::validation("limit", "too deep"));
        assert!(err.is_validation());
    }
}

/*
[INPUT]:  HTTP client configuration and exchange endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When changing client behavior or error taxonomy
*/

pub mod client;
pub mod error;

pub use error::{ExchangeError, Result, UpstreamError};

pub use client::{ClientConfig, ExchangeClient};

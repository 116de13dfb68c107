/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public exchange adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod exchange;
pub mod http;
pub mod types;

// Re-export commonly used types from exchange
pub use exchange::{BinanceAdapter, BybitAdapter, ExchangeAdapter};

// Re-export commonly used types from http
pub use http::{ClientConfig, ExchangeClient, ExchangeError, Result, UpstreamError};

// Re-export all types
pub use types::*;

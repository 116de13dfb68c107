/*
[INPUT]:  Exchange REST schemas and the pipeline service envelope
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - wire types, one target per exchange envelope
[UPDATE]: When an exchange schema changes or a new envelope is consumed
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::RawLevel;

/// GET /api/v3/ticker/price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinanceTicker {
    pub symbol: String,
    pub price: String,
}

/// GET /api/v3/depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinanceDepth {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: i64,
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    #[serde(default)]
    pub asks: Vec<RawLevel>,
}

/// Bybit v5 wraps every result in a `retCode`/`retMsg` envelope.
///
/// On errors Bybit still answers HTTP 200 with `"result": {}`, so result
/// types default every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BybitEnvelope<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    pub result: Option<T>,
    #[serde(default)]
    pub time: Option<i64>,
}

impl<T> BybitEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.ret_code == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BybitTickerList {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub list: Vec<BybitTicker>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BybitTicker {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "lastPrice", default)]
    pub last_price: Option<String>,
}

/// GET /v5/market/orderbook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BybitOrderBook {
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "b", default)]
    pub bids: Vec<RawLevel>,
    #[serde(rename = "a", default)]
    pub asks: Vec<RawLevel>,
    #[serde(default)]
    pub ts: Option<i64>,
    #[serde(rename = "u", default)]
    pub update_id: Option<i64>,
}

/// Envelope spoken by the per-exchange pipeline services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    /// Data of a successful response, or the reported error message.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("response marked success but carried no data".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "upstream reported failure".to_string())),
        }
    }
}

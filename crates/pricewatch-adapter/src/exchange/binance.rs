/*
[INPUT]:  Symbol identifiers and depth limits
[OUTPUT]: Binance spot price and order book in canonical form
[POS]:    Adapter layer - Binance public REST endpoints (flat documents)
[UPDATE]: When Binance endpoints or response format change
*/

use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{ExchangeAdapter, ensure_valid, parse_decimal};
use crate::http::{ClientConfig, ExchangeClient, ExchangeError, Result};
use crate::types::{BinanceDepth, BinanceTicker, DepthRequest, Exchange, OrderBook, normalize_symbol};

pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";
const API_KEY_HEADER: &str = "x-mbx-apikey";

#[derive(Debug, Clone)]
pub struct BinanceAdapter {
    client: ExchangeClient,
}

impl BinanceAdapter {
    pub fn new(config: ClientConfig, base_url: &str, api_key: Option<&str>) -> Result<Self> {
        let client = match api_key.filter(|key| !key.is_empty()) {
            Some(key) => ExchangeClient::with_headers(config, base_url, &[(API_KEY_HEADER, key)])?,
            None => ExchangeClient::with_config(config, base_url)?,
        };
        Ok(Self { client })
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    /// GET /api/v3/ticker/price?symbol={symbol}
    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        let symbol = normalize_symbol(symbol)?;
        debug!(exchange = "binance", %symbol, "requesting price");

        let builder = self
            .client
            .request(Method::GET, "/api/v3/ticker/price")?
            .query(&[("symbol", symbol.as_str())]);
        let ticker: BinanceTicker = self.client.send_json(builder).await.map_err(|e| {
            warn!(exchange = "binance", %symbol, error = %e, "price request failed");
            ExchangeError::api(Exchange::Binance, &symbol, e)
        })?;

        parse_decimal("price", &ticker.price)
            .map_err(|e| ExchangeError::api(Exchange::Binance, &symbol, e))
    }

    /// GET /api/v3/depth?symbol={symbol}&limit={limit}
    async fn get_order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook> {
        let request = DepthRequest::new(symbol, limit, self.depth_limits())?;
        debug!(exchange = "binance", symbol = %request.symbol, limit, "requesting order book");

        let builder = self
            .client
            .request(Method::GET, "/api/v3/depth")?
            .query(&[("symbol", request.symbol.clone()), ("limit", request.limit.to_string())]);
        let depth: BinanceDepth = self.client.send_json(builder).await.map_err(|e| {
            warn!(exchange = "binance", symbol = %request.symbol, error = %e, "order book request failed");
            ExchangeError::api(Exchange::Binance, &request.symbol, e)
        })?;

        let book = OrderBook {
            bids: depth.bids,
            asks: depth.asks,
            last_update_id: Some(depth.last_update_id),
        };
        ensure_valid(&book).map_err(|e| ExchangeError::api(Exchange::Binance, &request.symbol, e))?;
        Ok(book)
    }
}

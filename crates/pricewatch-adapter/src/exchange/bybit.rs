/*
[INPUT]:  Symbol identifiers, depth limits and product category
[OUTPUT]: Bybit price and order book in canonical form
[POS]:    Adapter layer - Bybit v5 public endpoints (retCode envelope)
[UPDATE]: When Bybit endpoints or envelope format change
*/

use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ExchangeAdapter, ensure_valid, parse_decimal};
use crate::http::{ClientConfig, ExchangeClient, ExchangeError, Result, UpstreamError};
use crate::types::{
    BybitEnvelope, BybitOrderBook, BybitTickerList, DepthRequest, Exchange, OrderBook,
    normalize_symbol,
};

pub const DEFAULT_BYBIT_URL: &str = "https://api.bybit.com";
pub const DEFAULT_BYBIT_CATEGORY: &str = "spot";

#[derive(Debug, Clone)]
pub struct BybitAdapter {
    client: ExchangeClient,
    category: String,
}

impl BybitAdapter {
    pub fn new(config: ClientConfig, base_url: &str, category: &str) -> Result<Self> {
        Ok(Self {
            client: ExchangeClient::with_config(config, base_url)?,
            category: category.to_string(),
        })
    }

    /// Fetch an endpoint and unwrap the `retCode` envelope.
    async fn fetch<T: DeserializeOwned>(
        &self,
        symbol: &str,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let builder = self
            .client
            .request(Method::GET, endpoint)?
            .query(&[("category", self.category.as_str())])
            .query(query);
        let unwrap = async {
            let envelope: BybitEnvelope<T> = self.client.send_json(builder).await?;
            if !envelope.is_success() {
                return Err(UpstreamError::Envelope {
                    code: envelope.ret_code,
                    message: envelope.ret_msg,
                });
            }
            envelope.result.ok_or(UpstreamError::MissingField("result"))
        };

        unwrap.await.map_err(|e| {
            warn!(exchange = "bybit", %symbol, %endpoint, error = %e, "request failed");
            ExchangeError::api(Exchange::Bybit, symbol, e)
        })
    }
}

#[async_trait]
impl ExchangeAdapter for BybitAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    /// GET /v5/market/tickers?category={category}&symbol={symbol}
    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        let symbol = normalize_symbol(symbol)?;
        debug!(exchange = "bybit", %symbol, "requesting price");

        let tickers: BybitTickerList = self
            .fetch(&symbol, "/v5/market/tickers", &[("symbol", symbol.as_str())])
            .await?;

        let last_price = tickers
            .list
            .first()
            .and_then(|ticker| ticker.last_price.as_deref())
            .ok_or_else(|| {
                ExchangeError::api(
                    Exchange::Bybit,
                    &symbol,
                    UpstreamError::MissingField("result.list[0].lastPrice"),
                )
            })?;

        parse_decimal("lastPrice", last_price)
            .map_err(|e| ExchangeError::api(Exchange::Bybit, &symbol, e))
    }

    /// GET /v5/market/orderbook?category={category}&symbol={symbol}&limit={limit}
    async fn get_order_book(&self, symbol: &str, limit: u32) -> Result<OrderBook> {
        let request = DepthRequest::new(symbol, limit, self.depth_limits())?;
        debug!(exchange = "bybit", symbol = %request.symbol, limit, "requesting order book");

        let limit = request.limit.to_string();
        let result: BybitOrderBook = self
            .fetch(
                &request.symbol,
                "/v5/market/orderbook",
                &[("symbol", request.symbol.as_str()), ("limit", limit.as_str())],
            )
            .await?;

        let book = OrderBook {
            bids: result.bids,
            asks: result.asks,
            last_update_id: result.update_id,
        };
        ensure_valid(&book).map_err(|e| ExchangeError::api(Exchange::Bybit, &request.symbol, e))?;
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawLevel;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> BybitAdapter {
        BybitAdapter::new(ClientConfig::default(), &server.uri(), DEFAULT_BYBIT_CATEGORY)
            .expect("adapter init")
    }

    #[tokio::test]
    async fn test_get_price() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "spot",
                "list": [{"symbol": "BTCUSDT", "lastPrice": "64120.5", "bid1Price": "64120.4"}]
            },
            "time": 1700000000000
        }"#;

        Mock::given(method("GET"))
            .and(path("/v5/market/tickers"))
            .and(query_param("category", "spot"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(mock_response, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let price = adapter(&server)
            .get_price("BTCUSDT")
            .await
            .expect("get_price failed");

        assert_eq!(price, "64120.5".parse::<Decimal>().expect("decimal"));
    }

    #[tokio::test]
    async fn test_symbol_cannot_override_category() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/tickers"))
            .and(query_param("category", "spot"))
            .and(query_param("symbol", "BTCUSDT&CATEGORY=LINEAR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {"category": "spot", "list": [{"symbol": "X", "lastPrice": "2"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let price = adapter(&server)
            .get_price("BTCUSDT&category=linear")
            .await
            .expect("get_price failed");

        assert_eq!(price, Decimal::TWO);
    }

    #[tokio::test]
    async fn test_get_price_envelope_error_with_http_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/tickers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 10001,
                "retMsg": "Not supported symbols",
                "result": {},
                "time": 1_700_000_000_000_i64
            })))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .get_price("NOPEUSDT")
            .await
            .expect_err("retCode 10001 must fail");

        match err {
            ExchangeError::Api { exchange, source: UpstreamError::Envelope { code, message }, .. } => {
                assert_eq!(exchange, Exchange::Bybit);
                assert_eq!(code, 10001);
                assert_eq!(message, "Not supported symbols");
            }
            other => panic!("expected envelope error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_price_empty_list_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/tickers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {"category": "spot", "list": []}
            })))
            .mount(&server)
            .await;

        let err = adapter(&server).get_price("BTCUSDT").await.expect_err("empty list");
        assert!(matches!(
            err,
            ExchangeError::Api { source: UpstreamError::MissingField(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_get_order_book() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "s": "BTCUSDT",
                "a": [["65557.7", "16.606555"]],
                "b": [["65485.47", "47.081829"], ["65485.46", "0.5"]],
                "ts": 1716863719031,
                "u": 230704,
                "seq": 1432604333
            },
            "time": 1716863719382
        }"#;

        Mock::given(method("GET"))
            .and(path("/v5/market/orderbook"))
            .and(query_param("category", "spot"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(mock_response, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let book = adapter(&server)
            .get_order_book("btcusdt", 50)
            .await
            .expect("get_order_book failed");

        let expected = OrderBook {
            bids: vec![
                RawLevel::new("65485.47", "47.081829"),
                RawLevel::new("65485.46", "0.5"),
            ],
            asks: vec![RawLevel::new("65557.7", "16.606555")],
            last_update_id: Some(230704),
        };
        assert_eq!(book, expected);
    }

    #[tokio::test]
    async fn test_get_order_book_rejects_limit_above_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/orderbook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = adapter(&server)
            .get_order_book("BTCUSDT", 500)
            .await
            .expect_err("500 exceeds Bybit spot depth");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_get_order_book_empty_side_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/orderbook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {"s": "BTCUSDT", "a": [["1", "1"]], "b": []}
            })))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .get_order_book("BTCUSDT", 1)
            .await
            .expect_err("empty bids");
        assert!(matches!(
            err,
            ExchangeError::Api { source: UpstreamError::InvalidOrderBook(_), .. }
        ));
    }
}

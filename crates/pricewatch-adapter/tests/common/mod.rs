/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for pricewatch-adapter tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mount a Binance ticker response for any symbol
pub async fn mount_binance_price(server: &MockServer, symbol: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": symbol,
            "price": price,
        })))
        .mount(server)
        .await;
}

/// Mount a Bybit ticker response for any symbol
pub async fn mount_bybit_price(server: &MockServer, symbol: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path("/v5/market/tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "spot",
                "list": [{"symbol": symbol, "lastPrice": price}]
            },
            "time": 1_700_000_000_000_i64
        })))
        .mount(server)
        .await;
}

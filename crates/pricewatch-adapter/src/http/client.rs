/*
[INPUT]:  HTTP configuration (base URL, timeouts, optional API key header)
[OUTPUT]: Configured reqwest client ready for public market data calls
[POS]:    HTTP layer - core client implementation shared by all adapters
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::error::{ExchangeError, Result, UpstreamError};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Thin reqwest wrapper bound to one base URL.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    http_client: Client,
    base_url: Url,
}

impl ExchangeClient {
    /// Create a client for `base_url` with custom configuration
    pub fn with_config(config: ClientConfig, base_url: &str) -> Result<Self> {
        Self::with_headers(config, base_url, &[])
    }

    /// Create a client that sends extra headers on every request
    pub fn with_headers(
        config: ClientConfig,
        base_url: &str,
        headers: &[(&'static str, &str)],
    ) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in headers {
            let value = HeaderValue::from_str(value)
                .map_err(|e| ExchangeError::Config(format!("invalid header {name}: {e}")))?;
            default_headers.insert(HeaderName::from_static(name), value);
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ExchangeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Build full URL for an endpoint
    fn url(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(endpoint)
    }

    /// Build request builder for an endpoint
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode a JSON body, failing on non-success status.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> std::result::Result<T, UpstreamError> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(UpstreamError::status(status, truncate(&body, 512)));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn rejects_invalid_base_url() {
        let err = ExchangeClient::with_config(ClientConfig::default(), "not a url")
            .expect_err("invalid url");
        assert!(matches!(err, ExchangeError::Config(_)));
    }

    #[tokio::test]
    async fn sends_default_headers_and_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("x-mbx-apikey", "key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExchangeClient::with_headers(
            ClientConfig::default(),
            &server.uri(),
            &[("x-mbx-apikey", "key-1")],
        )
        .expect("client init");

        let builder = client.request(Method::GET, "/ping").expect("builder");
        let body: Value = client.send_json(builder).await.expect("json body");
        assert_eq!(body["ok"], Value::Bool(true));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client =
            ExchangeClient::with_config(ClientConfig::default(), &server.uri()).expect("client");
        let builder = client.request(Method::GET, "/down").expect("builder");
        let err = client
            .send_json::<Value>(builder)
            .await
            .expect_err("503 must fail");

        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}

/*
[INPUT]:  Symbol requests from the comparison engine
[OUTPUT]: Price and market stats from an in-process or remote pipeline
[POS]:    Comparison layer - the seam between comparison and exchange pipelines
[UPDATE]: When adding source kinds or changing the remote envelope
*/

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use pricewatch_adapter::{ApiResponse, Exchange, MarketStats};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ComparisonError, PipelineError};
use crate::service::ExchangeService;

/// One side of a comparison.
#[async_trait]
pub trait MarketSource: Send + Sync + fmt::Debug {
    /// Name reported in comparison results and errors.
    fn name(&self) -> &str;

    async fn price(&self, symbol: &str) -> Result<Decimal, ComparisonError>;

    async fn market_stats(&self, symbol: &str) -> Result<MarketStats, ComparisonError>;
}

fn pipeline_failure(source_name: &str, error: PipelineError) -> ComparisonError {
    ComparisonError::Pipeline {
        source_name: source_name.to_string(),
        error: Box::new(error),
    }
}

#[async_trait]
impl MarketSource for ExchangeService {
    fn name(&self) -> &str {
        self.exchange().as_str()
    }

    async fn price(&self, symbol: &str) -> Result<Decimal, ComparisonError> {
        self.get_price(symbol)
            .await
            .map_err(|e| pipeline_failure(self.name(), e))
    }

    async fn market_stats(&self, symbol: &str) -> Result<MarketStats, ComparisonError> {
        self.get_market_stats(symbol)
            .await
            .map_err(|e| pipeline_failure(self.name(), e))
    }
}

/// Exchange pipeline exposed by another process over HTTP.
///
/// Reads `GET {base}/api/{route}/price/{SYMBOL}` and
/// `GET {base}/api/{route}/marketstats/{SYMBOL}`, both wrapped in an
/// [`ApiResponse`] envelope.
#[derive(Clone)]
pub struct HttpMarketSource {
    name: String,
    route: String,
    base_url: Url,
    http_client: Client,
}

impl fmt::Debug for HttpMarketSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMarketSource")
            .field("name", &self.name)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpMarketSource {
    pub fn new(
        name: impl Into<String>,
        route: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ComparisonError> {
        let name = name.into();
        let base_url = Url::parse(base_url)
            .and_then(|url| {
                if url.cannot_be_a_base() {
                    Err(url::ParseError::RelativeUrlWithCannotBeABaseBase)
                } else {
                    Ok(url)
                }
            })
            .map_err(|error| ComparisonError::InvalidUrl {
                source_name: name.clone(),
                error,
            })?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ComparisonError::Transport {
                source_name: name.clone(),
                error,
            })?;

        Ok(Self {
            name,
            route: route.into(),
            base_url,
            http_client,
        })
    }

    /// Remote pipeline for `exchange`, named and routed after it.
    pub fn for_exchange(
        exchange: Exchange,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ComparisonError> {
        Self::new(exchange.as_str(), exchange.as_str(), base_url, timeout)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        symbol: &str,
    ) -> Result<T, ComparisonError> {
        // Segments are percent-encoded, so a symbol cannot add path levels.
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| ComparisonError::InvalidUrl {
                source_name: self.name.clone(),
                error: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .clear()
            .extend(["api", self.route.as_str(), resource, symbol.trim()]);
        debug!(source = %self.name, %url, "requesting remote pipeline");

        let transport = |error: reqwest::Error| ComparisonError::Transport {
            source_name: self.name.clone(),
            error,
        };
        let response = self.http_client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) => envelope
                .into_result()
                .map_err(|message| ComparisonError::Rejected {
                    source_name: self.name.clone(),
                    message,
                }),
            Err(_) if !status.is_success() => Err(ComparisonError::Status {
                source_name: self.name.clone(),
                status: status.as_u16(),
            }),
            Err(error) => Err(ComparisonError::Malformed {
                source_name: self.name.clone(),
                error,
            }),
        }
    }
}

#[async_trait]
impl MarketSource for HttpMarketSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn price(&self, symbol: &str) -> Result<Decimal, ComparisonError> {
        self.fetch("price", symbol).await
    }

    async fn market_stats(&self, symbol: &str) -> Result<MarketStats, ComparisonError> {
        self.fetch("marketstats", symbol).await
    }
}

/*
[INPUT]:  Two named market sources and a symbol
[OUTPUT]: ComparisonResult (difference, percentage, recommended source)
[POS]:    Comparison layer - concurrent fan-out and reconciliation
[UPDATE]: When the comparison metrics or recommendation rule change
*/

use std::sync::Arc;

use chrono::Utc;
use pricewatch_adapter::{ComparisonResult, MarketStats, normalize_symbol};
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::error::{ComparisonError, Result};
use crate::source::MarketSource;

/// Absolute and percentage difference of `price_b` over `price_a`.
///
/// A zero `price_a` is replaced by 1 as the divisor. `None` when either
/// value leaves the decimal range.
pub fn price_difference(price_a: Decimal, price_b: Decimal) -> Option<(Decimal, Decimal)> {
    let difference = price_b.checked_sub(price_a)?;
    let divisor = if price_a.is_zero() { Decimal::ONE } else { price_a };
    let percentage = difference
        .checked_div(divisor)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some((difference, percentage))
}

/// Compares the same symbol across two sources, A and B.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    source_a: Arc<dyn MarketSource>,
    source_b: Arc<dyn MarketSource>,
}

impl ComparisonEngine {
    pub fn new(source_a: Arc<dyn MarketSource>, source_b: Arc<dyn MarketSource>) -> Self {
        Self { source_a, source_b }
    }

    /// Compare last prices only. Both sources are queried concurrently and
    /// either failure fails the whole comparison.
    pub async fn compare_prices(&self, symbol: &str) -> Result<ComparisonResult> {
        let symbol = normalize_symbol(symbol)?;
        info!(%symbol, a = self.source_a.name(), b = self.source_b.name(), "comparing prices");

        let (price_a, price_b) =
            tokio::try_join!(self.source_a.price(&symbol), self.source_b.price(&symbol))
                .inspect_err(|e| error!(%symbol, error = %e, "price comparison failed"))?;

        self.reconcile(symbol, price_a, price_b, None)
    }

    /// Compare full market stats; prices are taken from each side's stats.
    pub async fn compare_market_stats(&self, symbol: &str) -> Result<ComparisonResult> {
        let symbol = normalize_symbol(symbol)?;
        info!(%symbol, a = self.source_a.name(), b = self.source_b.name(), "comparing market stats");

        let (stats_a, stats_b) = tokio::try_join!(
            self.source_a.market_stats(&symbol),
            self.source_b.market_stats(&symbol)
        )
        .inspect_err(|e| error!(%symbol, error = %e, "market stats comparison failed"))?;

        self.reconcile(
            symbol,
            stats_a.current_price,
            stats_b.current_price,
            Some((stats_a, stats_b)),
        )
    }

    fn reconcile(
        &self,
        symbol: String,
        price_a: Decimal,
        price_b: Decimal,
        stats: Option<(MarketStats, MarketStats)>,
    ) -> Result<ComparisonResult> {
        // B is measured against A, so an unrepresentable result is B's quote.
        let (difference_absolute, difference_percentage) = price_difference(price_a, price_b)
            .ok_or_else(|| ComparisonError::OutOfRange {
                source_name: self.source_b.name().to_string(),
                price: price_b.to_string(),
            })
            .inspect_err(|e| error!(%symbol, error = %e, "comparison out of range"))?;
        // B only when it quotes strictly higher; ties go to A.
        let recommended = if difference_percentage > Decimal::ZERO {
            self.source_b.name()
        } else {
            self.source_a.name()
        };
        let (stats_a, stats_b) = stats.unzip();

        Ok(ComparisonResult {
            symbol,
            exchange_a: self.source_a.name().to_string(),
            exchange_b: self.source_b.name().to_string(),
            price_a,
            price_b,
            difference_absolute,
            difference_percentage,
            recommended_exchange: recommended.to_string(),
            stats_a,
            stats_b,
            timestamp: Utc::now(),
        })
    }
}

/*
[INPUT]:  A fallible async operation and an attempt budget
[OUTPUT]: First success, or the last failure once the budget is spent
[POS]:    Resilience layer - bounded retries with exponential backoff
[UPDATE]: When backoff timing or retry classification changes
*/

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// Bounded retry with exponential backoff.
///
/// The wait after failed attempt `n` (1-based) is `initial_backoff * 2^(n-1)`,
/// so the defaults wait 2s then 4s between three attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Attempts actually made; a budget of 0 still runs once.
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// Every error is retried. The closure receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.effective_attempts();
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation = operation_name, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        operation = operation_name,
                        attempts = max_attempts,
                        error = %err,
                        "giving up"
                    );
                    return Err(PipelineError::RetryExhausted {
                        attempts: max_attempts,
                        last: Box::new(err),
                    });
                }
            }
        }
    }
}

//! Retry policy for preview generation.
//!
//! Only timeout-classified errors are retried; everything else propagates
//! immediately. The delay scales linearly with the attempt number.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::domain::ports::AiError;

/// Linear-backoff retry for timeout-classified preview failures.
#[derive(Debug, Clone)]
pub struct PreviewRetryPolicy {
    /// Extra attempts after the first
    max_retries: u32,
    /// Backoff unit; delay = backoff_ms * attempt
    backoff_ms: u64,
}

impl PreviewRetryPolicy {
    pub fn new(max_retries: u32, backoff_ms: u64) -> Self {
        Self { max_retries, backoff_ms }
    }

    /// Execute `operation`, retrying timeout-classified failures up to the
    /// attempt ceiling.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, AiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        let max_attempts = self.max_retries.saturating_add(1).max(1);
        let mut attempt: u32 = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_timeout() || attempt >= max_attempts {
                        return Err(err);
                    }
                    let backoff = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "preview request timed out, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

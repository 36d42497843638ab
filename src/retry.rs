// Exponential backoff with jitter for rate-limited annotation calls

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::AnalysisError;

pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 64;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Delay before retry number `retry` (0-based): `min(2^retry, max_backoff_secs) + jitter`.
pub fn backoff_delay(retry: u32, max_backoff_secs: u64, jitter: f64) -> Duration {
    let base = 2u64
        .checked_pow(retry)
        .unwrap_or(u64::MAX)
        .min(max_backoff_secs);
    Duration::from_secs_f64(base as f64 + jitter)
}

/// Retries an operation while it fails with [`AnalysisError::RateLimited`].
///
/// Any other error is returned immediately. `max_attempts` counts total calls;
/// 0 means retry forever.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_backoff_secs: u64,
    pub max_attempts: u32,
    rate_limited_total: Option<Arc<AtomicU64>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BACKOFF_SECS, DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    pub fn new(max_backoff_secs: u64, max_attempts: u32) -> Self {
        Self {
            max_backoff_secs,
            max_attempts,
            rate_limited_total: None,
        }
    }

    /// Count every rate-limited response into `counter`.
    pub fn with_counter(mut self, counter: Arc<AtomicU64>) -> Self {
        self.rate_limited_total = Some(counter);
        self
    }

    pub async fn attempt<T, F, Fut>(&self, op: F) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        self.attempt_with_jitter(op, rand::random::<f64>).await
    }

    /// Same as [`attempt`](Self::attempt) with a caller-supplied jitter source in `[0, 1)`.
    pub async fn attempt_with_jitter<T, F, Fut, J>(
        &self,
        mut op: F,
        mut jitter: J,
    ) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
        J: FnMut() -> f64,
    {
        let mut attempts: u32 = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limited() => e,
                Err(e) => return Err(e),
            };
            attempts = attempts.saturating_add(1);
            if let Some(counter) = &self.rate_limited_total {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            if self.max_attempts > 0 && attempts >= self.max_attempts {
                tracing::warn!(error = %err, attempts, "giving up after repeated rate limiting");
                return Err(AnalysisError::RetryExhausted { attempts });
            }
            let delay = backoff_delay(attempts - 1, self.max_backoff_secs, jitter());
            tracing::warn!(
                error = %err,
                attempt = attempts,
                "Rate limited, backing off for {:.2} seconds",
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }
    }
}

//! Retry of model calls with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::error::ChatError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Upper bound for any single wait, including server-requested ones.
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Default backoff with `retries` extra attempts.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (0-based), without jitter.
    fn backoff(&self, retry: u32) -> Duration {
        let exp = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }

    /// Wait before retrying after `error`.
    ///
    /// A rate limit that names its own delay is never retried sooner than
    /// requested; every wait is capped at `max_backoff`.
    pub fn delay_for(&self, retry: u32, error: &ChatError, jitter: f64) -> Duration {
        let jittered = self.backoff(retry).mul_f64(jitter.clamp(0.75, 1.25));
        let wait = match error {
            ChatError::RateLimited {
                retry_after_ms: Some(ms),
            } => jittered.max(Duration::from_millis(*ms)),
            _ => jittered,
        };
        wait.min(self.max_backoff)
    }

    /// Run `operation`, retrying retryable errors until attempts run out.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ChatError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChatError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut retry = 0;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() || retry + 1 >= attempts {
                return Err(err);
            }
            let wait = self.delay_for(retry, &err, jitter());
            warn!(
                attempt = retry + 1,
                max_attempts = attempts,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "model call failed, retrying"
            );
            tokio::time::sleep(wait).await;
            retry += 1;
        }
    }
}

/// Jitter multiplier in [0.75, 1.25).
fn jitter() -> f64 {
    let bits = Uuid::new_v4().as_u128() as u64;
    0.75 + (bits % 10_000) as f64 / 20_000.0
}

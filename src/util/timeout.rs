//! Timeout and cancellation helpers.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ChatError;

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, ChatError>>,
) -> Result<T, ChatError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ChatError::Timeout(duration.as_millis() as u64)),
    }
}

/// Race a future against a cancellation token.
///
/// The future is dropped as soon as the token fires.
pub async fn with_cancellation<T>(
    token: &CancellationToken,
    future: impl Future<Output = T>,
) -> Result<T, ChatError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ChatError::Canceled),
        value = future => Ok(value),
    }
}

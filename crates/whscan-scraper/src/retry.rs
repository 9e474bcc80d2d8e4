//! Caller-side retry for transient fetch failures.
//!
//! The fetcher never retries on its own. The pool runs each fetch through a
//! [`RetryPolicy`]; with `max_retries = 0` (the default) a failure is recorded
//! immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Upper bound on a server-requested `Retry-After` wait.
pub(crate) const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::from_millis(backoff_base_ms),
        }
    }

    /// How long to wait before retry number `retry` (0-based) after `err`,
    /// or `None` when `err` should be returned as is.
    ///
    /// The wait doubles with every retry. A rate-limited response waits at
    /// least as long as the server asked for, capped at [`MAX_RETRY_AFTER`].
    pub(crate) fn delay_for(&self, retry: u32, err: &FetchError) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        let backoff = self
            .backoff_base
            .saturating_mul(2u32.saturating_pow(retry));
        match err {
            FetchError::Timeout | FetchError::Connection(_) => Some(backoff),
            FetchError::RateLimited { retry_after_secs } => {
                let requested = Duration::from_secs(*retry_after_secs).min(MAX_RETRY_AFTER);
                Some(backoff.max(requested))
            }
            FetchError::Request(_) => None,
        }
    }

    /// Runs `operation` until it succeeds, fails with a non-transient error,
    /// or the retry budget is spent. The last error is returned.
    pub(crate) async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let Some(delay) = self.delay_for(retry, &err) else {
                return Err(err);
            };
            tracing::debug!(
                retry,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient fetch error; retrying"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}

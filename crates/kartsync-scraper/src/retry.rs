//! Pacing and retry utilities shared by the fetcher and the asset downloader.
//!
//! Sleeping goes through the [`Clock`] trait so tests can substitute a clock
//! that records requested delays instead of waiting for them.
//!
//! The default [`RetryPolicy`] never retries: a failed item is logged and
//! skipped by the caller. Callers opt into retries through configuration.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::ScraperError;

/// Source of delays for politeness pauses and retry backoff.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// [`Clock`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Exponential backoff policy: the wait before the n-th retry is
/// `backoff_base_ms * 2^(n-1)`, capped at [`RetryPolicy::MAX_DELAY_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub const MAX_DELAY_MS: u64 = 60_000;

    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let ms = self
            .backoff_base_ms
            .saturating_mul(1u64 << shift)
            .min(Self::MAX_DELAY_MS);
        Duration::from_millis(ms)
    }
}

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable: network failures, HTTP 429, HTTP 5xx. Everything else
/// (4xx, redirect loops, parse and I/O errors) would fail the same way again.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Network(e) => !e.is_redirect(),
        ScraperError::RateLimited { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation`, retrying transient errors according to `policy`.
///
/// Non-retriable errors are returned immediately. When retries are exhausted
/// the last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    clock: &dyn Clock,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient error, retrying after backoff"
                );
                clock.sleep(delay).await;
            }
        }
    }
}

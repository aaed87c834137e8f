//! Request dispatcher: the composition root of the pipeline.
//!
//! One logical call runs this state machine:
//!
//! ```text
//! CHECK_CACHE ─hit──────────────────────────────────────────────▶ DONE_SUCCESS
//!      │ miss
//!      ▼
//! ACQUIRE_TOKEN ──▶ ATTEMPT ──▶ CLASSIFY ─success──▶ STORE_CACHE ─▶ DONE_SUCCESS
//!      ▲                            │
//!      └── SLEEP(backoff) ◀─retryable, budget left
//!                                   │
//!                                   └─non-retryable or budget spent─▶ DONE_ERROR
//!
//! cancellation at any suspension point ─────────────────────▶ DONE_ERROR(Cancelled)
//! ```
//!
//! Every attempt re-acquires a token, so retries spend admission budget too.
//! No lock is held across a suspension point.

use crate::application::limiter::RateLimiter;
use crate::application::metrics::Metrics;
use crate::application::ports::Cache;
use crate::application::suspend::cancellable_sleep;
use crate::domain::attempt::AttemptOutcome;
use crate::domain::error::DomainError;
use crate::domain::retry::RetryPolicy;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Wraps cacheable, retryable outbound calls.
///
/// Cloning is cheap; clones share the limiter, the cache and the metrics.
/// Independent dispatchers never share state.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    cache: Option<Arc<dyn Cache>>,
    limiter: Arc<RateLimiter>,
    retry_policy: RetryPolicy,
    metrics: Metrics,
}

impl Dispatcher {
    /// Create a dispatcher from its parts.
    ///
    /// Most callers want [`Dispatcher::builder`].
    pub fn from_parts(
        cache: Option<Arc<dyn Cache>>,
        limiter: Arc<RateLimiter>,
        retry_policy: RetryPolicy,
        metrics: Metrics,
    ) -> Self {
        Self {
            cache,
            limiter,
            retry_policy,
            metrics,
        }
    }

    /// Run one logical operation.
    ///
    /// Serves `key` from the cache when a live entry exists. Otherwise calls
    /// `attempt` (after taking a rate-limit token each time) until it succeeds,
    /// fails with a non-retryable status, or the retry budget is spent. A
    /// successful payload is cached for `ttl`; a zero `ttl` skips the store.
    ///
    /// # Errors
    /// - The last classified error when attempts fail.
    /// - `DomainError::Cancelled` when `cancel` fires while waiting for a token,
    ///   during an attempt, or during a backoff sleep. Cancellation wins over
    ///   any error already classified.
    pub async fn execute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<Vec<u8>, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AttemptOutcome>,
    {
        if let Some(cache) = &self.cache {
            if let Some(payload) = cache.get(key) {
                self.metrics.record_cache_hit();
                debug!(key, "cache hit");
                return Ok(payload);
            }
            self.metrics.record_cache_miss();
            debug!(key, "cache miss");
        }

        let budget = self.retry_policy.attempt_budget();
        let mut attempt_index: u32 = 0;

        loop {
            if self.limiter.wait(cancel).await.is_err() {
                return Err(self.cancelled(key, attempt_index));
            }

            self.metrics.record_attempt();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(key, attempt_index)),
                outcome = attempt() => outcome,
            };

            let status = outcome.status;
            let error = match outcome.into_result() {
                Ok(payload) => {
                    self.store(key, &payload, ttl);
                    debug!(key, attempts = attempt_index + 1, "request succeeded");
                    return Ok(payload);
                }
                Err(error) => error,
            };

            let budget_left = attempt_index + 1 < budget;
            if !RetryPolicy::is_retryable(status) || !budget_left {
                self.metrics.record_failure();
                debug!(
                    key,
                    attempts = attempt_index + 1,
                    status,
                    error = %error,
                    "giving up"
                );
                return Err(error);
            }

            let backoff = self.retry_policy.calculate_backoff(attempt_index);
            self.metrics.record_retry();
            warn!(
                key,
                attempt = attempt_index + 1,
                status,
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "retryable upstream failure, backing off"
            );

            if cancellable_sleep(backoff, cancel).await.is_err() {
                return Err(self.cancelled(key, attempt_index + 1));
            }
            attempt_index += 1;
        }
    }

    /// Best-effort cache write after a successful attempt.
    fn store(&self, key: &str, payload: &[u8], ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        if let Some(cache) = &self.cache {
            cache.set(key, payload.to_vec(), ttl);
        }
    }

    fn cancelled(&self, key: &str, attempts: u32) -> DomainError {
        self.metrics.record_cancellation();
        debug!(key, attempts, "request cancelled");
        DomainError::Cancelled
    }

    /// Shared dispatch metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The admission controller.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// The result cache, if caching is enabled.
    pub fn cache(&self) -> Option<&Arc<dyn Cache>> {
        self.cache.as_ref()
    }
}

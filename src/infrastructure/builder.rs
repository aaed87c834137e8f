//! Dispatcher construction.
//!
//! Collects settings, validates them once in [`DispatcherBuilder::build`] and
//! wires the default adapters (system clock, in-memory cache) where nothing
//! else was supplied.

use crate::application::{
    dispatcher::Dispatcher,
    limiter::{LimiterError, RateLimiter},
    metrics::Metrics,
    ports::{Cache, Clock},
};
use crate::domain::retry::{RetryPolicy, RetryPolicyError};
use crate::infrastructure::cache::MemoryCache;
use crate::infrastructure::clock::SystemClock;
use std::sync::Arc;
use thiserror::Error;

/// Requests per second admitted when no rate is configured.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;

/// Error returned when building a [`Dispatcher`] fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Rate or burst settings were rejected
    #[error("rate limiter configuration error: {0}")]
    Limiter(#[from] LimiterError),
    /// Retry settings were rejected
    #[error("retry policy configuration error: {0}")]
    RetryPolicy(#[from] RetryPolicyError),
}

#[derive(Debug, Clone)]
enum CacheSetting {
    Memory,
    Custom(Arc<dyn Cache>),
    Disabled,
}

/// Builder for [`Dispatcher`].
///
/// # Example
/// ```
/// use catalog_dispatch::{Dispatcher, RetryPolicy};
/// use std::time::Duration;
///
/// let dispatcher = Dispatcher::builder()
///     .with_requests_per_second(5.0)
///     .with_burst(20.0)
///     .with_retry_policy(
///         RetryPolicy::new(4, Duration::from_millis(250), Duration::from_secs(5), 2.0).unwrap(),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(dispatcher.limiter().capacity(), 20.0);
/// assert_eq!(dispatcher.retry_policy().max_attempts(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherBuilder {
    requests_per_second: f64,
    burst: Option<f64>,
    retry_policy: RetryPolicy,
    cache: CacheSetting,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            burst: None,
            retry_policy: RetryPolicy::default(),
            cache: CacheSetting::Memory,
            clock: None,
        }
    }
}

impl DispatcherBuilder {
    /// Set the sustained admission rate.
    ///
    /// Default: 10 requests per second. Validated by `build()`.
    pub fn with_requests_per_second(mut self, requests_per_second: f64) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    /// Set the token bucket capacity explicitly.
    ///
    /// Default: the requests-per-second value, but never below one token.
    pub fn with_burst(mut self, capacity: f64) -> Self {
        self.burst = Some(capacity);
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Use a caller-supplied cache backend.
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = CacheSetting::Custom(cache);
        self
    }

    /// Disable result caching; every call goes upstream.
    pub fn without_cache(mut self) -> Self {
        self.cache = CacheSetting::Disabled;
        self
    }

    /// Use a custom time source for the limiter and the default cache.
    ///
    /// Primarily for tests. A cache passed to `with_cache` keeps its own clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the dispatcher.
    ///
    /// # Errors
    /// Returns `BuildError` if the rate or burst is invalid.
    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let capacity = self
            .burst
            .unwrap_or_else(|| RateLimiter::default_capacity(self.requests_per_second));
        let limiter = RateLimiter::with_clock(self.requests_per_second, capacity, clock.clone())?;

        let cache: Option<Arc<dyn Cache>> = match self.cache {
            CacheSetting::Memory => Some(Arc::new(MemoryCache::with_clock(clock))),
            CacheSetting::Custom(cache) => Some(cache),
            CacheSetting::Disabled => None,
        };

        Ok(Dispatcher::from_parts(
            cache,
            Arc::new(limiter),
            self.retry_policy,
            Metrics::new(),
        ))
    }
}

impl Dispatcher {
    /// Create a dispatcher with default settings.
    ///
    /// Equivalent to `Dispatcher::builder().build().unwrap()`.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("default configuration is always valid")
    }

    /// Start configuring a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

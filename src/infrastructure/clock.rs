//! Clock adapters for time operations.
//!
//! `SystemClock` reads time through tokio's clock, so the limiter's refill
//! arithmetic and its sleeps always agree, including under a paused test
//! runtime (`#[tokio::test(start_paused = true)]`). Outside a runtime it falls
//! back to the OS monotonic clock.
//!
//! The system-clock constructors of `RateLimiter` (`new`, `with_capacity`) live
//! here as well, so the application layer never names a concrete clock.
//!
//! # Testing
//!
//! See `MockClock` (in `crate::infrastructure::mocks`) for a clock that only
//! moves when told to. Available with the `test-helpers` feature or in test builds:
//!
//! ```toml
//! [dev-dependencies]
//! catalog-dispatch = { version = "*", features = ["test-helpers"] }
//! ```

use crate::application::limiter::{LimiterError, RateLimiter};
use crate::application::ports::Clock;
use std::sync::Arc;
use std::time::Instant;

/// Production clock backed by `tokio::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

impl RateLimiter {
    /// Create a limiter admitting `requests_per_second` on average, on the
    /// system clock.
    ///
    /// The bucket starts full with a capacity of `requests_per_second`
    /// (at least one token).
    ///
    /// # Errors
    /// Returns `LimiterError::InvalidRate` if the rate is not finite and positive.
    pub fn new(requests_per_second: f64) -> Result<Self, LimiterError> {
        Self::with_capacity(
            requests_per_second,
            Self::default_capacity(requests_per_second),
        )
    }

    /// Create a limiter with an explicit burst capacity, on the system clock.
    ///
    /// # Errors
    /// Returns `LimiterError` if the rate is not finite and positive, or the
    /// capacity is not finite and at least 1.
    pub fn with_capacity(requests_per_second: f64, capacity: f64) -> Result<Self, LimiterError> {
        Self::with_clock(requests_per_second, capacity, Arc::new(SystemClock::new()))
    }
}

//! Retry policy: exponential backoff schedule and retryable statuses.

use std::time::Duration;
use thiserror::Error;

/// Statuses worth another attempt: too many requests, unavailable, gateway timeout.
pub const RETRYABLE_STATUSES: [u16; 3] = [429, 503, 504];

/// Error returned when retry policy parameters are invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetryPolicyError {
    /// Initial delay must be greater than zero
    #[error("initial delay must be greater than 0")]
    ZeroInitialDelay,
    /// Max delay must not be shorter than the initial delay
    #[error("max delay {max:?} is shorter than initial delay {initial:?}")]
    MaxDelayBelowInitial {
        /// Configured initial delay
        initial: Duration,
        /// Configured max delay
        max: Duration,
    },
    /// Multiplier must be finite and at least 1.0
    #[error("multiplier must be finite and >= 1.0, got {0}")]
    InvalidMultiplier(f64),
}

/// Exponential backoff retry policy.
///
/// Immutable once constructed. The delay before retry `n` (zero-based) is
/// `min(initial_delay * multiplier^n, max_delay)`.
///
/// # Example
/// ```
/// use catalog_dispatch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(
///     3,
///     Duration::from_millis(100),
///     Duration::from_secs(1),
///     2.0,
/// )
/// .unwrap();
///
/// assert_eq!(policy.calculate_backoff(0), Duration::from_millis(100));
/// assert_eq!(policy.calculate_backoff(1), Duration::from_millis(200));
/// assert_eq!(policy.calculate_backoff(10), Duration::from_secs(1));
///
/// assert!(RetryPolicy::is_retryable(503));
/// assert!(!RetryPolicy::is_retryable(500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl RetryPolicy {
    /// Create a validated retry policy.
    ///
    /// # Arguments
    /// * `max_attempts` - Total attempts per logical call (0 behaves like 1)
    /// * `initial_delay` - Delay after the first failed attempt
    /// * `max_delay` - Upper bound for any single delay
    /// * `multiplier` - Growth factor between consecutive delays
    ///
    /// # Errors
    /// Returns `RetryPolicyError` if `initial_delay` is zero, `max_delay` is below
    /// `initial_delay`, or `multiplier` is not a finite value >= 1.0.
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Result<Self, RetryPolicyError> {
        if initial_delay.is_zero() {
            return Err(RetryPolicyError::ZeroInitialDelay);
        }
        if max_delay < initial_delay {
            return Err(RetryPolicyError::MaxDelayBelowInitial {
                initial: initial_delay,
                max: max_delay,
            });
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(RetryPolicyError::InvalidMultiplier(multiplier));
        }

        Ok(Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier,
        })
    }

    /// A policy that makes a single attempt and never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry `attempt` (zero-based).
    ///
    /// Non-decreasing in `attempt` and never above `max_delay`.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_nanos = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);

        // powi overflows to infinity for large exponents; the cap absorbs it.
        if delay_nanos >= self.max_delay.as_nanos() as f64 {
            self.max_delay
        } else {
            Duration::from_nanos(delay_nanos as u64)
        }
    }

    /// Whether a failed attempt with this status should be retried.
    ///
    /// Depends only on the status, never on how the failure was classified.
    pub fn is_retryable(status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// Total attempts a dispatcher makes for one logical call.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Configured maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the first failed attempt.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound for a single delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Growth factor between consecutive delays.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 100ms initial delay, 10s cap, doubling.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

//! Token-bucket admission control.
//!
//! The limiter gates how often outbound attempts may start. Tokens refill
//! lazily: every check first credits `elapsed * refill_rate` tokens (capped at
//! capacity), then tries to take one.

use crate::application::ports::Clock;
use crate::application::suspend::cancellable_sleep;
use crate::domain::error::Cancelled;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Error returned when limiter parameters are invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimiterError {
    /// Refill rate must be finite and positive
    #[error("requests per second must be finite and > 0, got {0}")]
    InvalidRate(f64),
    /// Capacity must be finite and able to hold at least one token
    #[error("burst capacity must be finite and >= 1, got {0}")]
    InvalidCapacity(f64),
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant, capacity: f64, refill_rate: f64) {
        if now > self.last_refill {
            let elapsed = now.duration_since(self.last_refill).as_secs_f64();
            self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
            self.last_refill = now;
        }
    }
}

/// Token-bucket rate limiter shared by every caller of one dispatcher.
///
/// Refill and consume happen in one critical section under a single mutex;
/// waiting happens outside the lock.
///
/// # Fairness
///
/// Blocked callers are not queued. Each one polls at a fixed `1 / refill_rate`
/// interval and whichever re-checks first after a refill gets the token, so a
/// caller can be overtaken by later arrivals. Backoff and rate budgets are
/// generous compared with one poll interval, so this is tolerated rather than
/// corrected.
///
/// # Example
/// ```
/// use catalog_dispatch::RateLimiter;
///
/// let limiter = RateLimiter::new(2.0).unwrap();
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(!limiter.try_acquire());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64,
    poll_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter reading time from `clock`.
    ///
    /// The bucket starts full. `RateLimiter::new` and
    /// `RateLimiter::with_capacity` supply the system clock.
    ///
    /// # Errors
    /// Returns `LimiterError` if the rate is not finite and positive, or the
    /// capacity is not finite and at least 1.
    pub fn with_clock(
        requests_per_second: f64,
        capacity: f64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LimiterError> {
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(LimiterError::InvalidRate(requests_per_second));
        }
        if !capacity.is_finite() || capacity < 1.0 {
            return Err(LimiterError::InvalidCapacity(capacity));
        }

        // Rounded up so one interval always refills at least one whole token.
        let poll_interval = Duration::from_nanos((1e9 / requests_per_second).ceil() as u64);

        Ok(Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: clock.now(),
            }),
            capacity,
            refill_rate: requests_per_second,
            poll_interval,
            clock,
        })
    }

    /// Default burst capacity for a rate: the rate itself, but at least one token.
    pub fn default_capacity(requests_per_second: f64) -> f64 {
        requests_per_second.max(1.0)
    }

    /// Take one token if available, without waiting.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.refill(now, self.capacity, self.refill_rate);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait until a token is available and take it.
    ///
    /// Returns `Err(Cancelled)` without consuming a token if `cancel` fires
    /// before a token is obtained, including when it was already cancelled.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            if self.try_acquire() {
                return Ok(());
            }

            tracing::trace!(
                poll_interval_ms = self.poll_interval.as_millis() as u64,
                "rate limiter exhausted, waiting for refill"
            );
            cancellable_sleep(self.poll_interval, cancel).await?;
        }
    }

    /// Tokens currently available, after crediting any pending refill.
    pub fn available_tokens(&self) -> f64 {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.refill(now, self.capacity, self.refill_rate);
        state.tokens
    }

    /// Maximum number of tokens the bucket holds.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Tokens credited per second.
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;

    fn limiter_with_mock_clock(rps: f64) -> (RateLimiter, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter =
            RateLimiter::with_clock(rps, RateLimiter::default_capacity(rps), clock.clone())
                .unwrap();
        (limiter, clock)
    }

    #[test]
    fn test_new_starts_full() {
        let limiter = RateLimiter::new(5.0).unwrap();
        assert_eq!(limiter.capacity(), 5.0);
        assert_eq!(limiter.refill_rate(), 5.0);
        assert!(limiter.available_tokens() >= 5.0);
    }

    #[test]
    fn test_fractional_rate_holds_one_token() {
        let limiter = RateLimiter::new(0.5).unwrap();
        assert_eq!(limiter.capacity(), 1.0);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(RateLimiter::new(0.0).unwrap_err(), LimiterError::InvalidRate(0.0));
        assert_eq!(RateLimiter::new(-1.0).unwrap_err(), LimiterError::InvalidRate(-1.0));
        assert!(matches!(
            RateLimiter::new(f64::NAN),
            Err(LimiterError::InvalidRate(_))
        ));
        assert!(matches!(
            RateLimiter::new(f64::INFINITY),
            Err(LimiterError::InvalidRate(_))
        ));
        assert_eq!(
            RateLimiter::with_capacity(1.0, 0.5).unwrap_err(),
            LimiterError::InvalidCapacity(0.5)
        );
    }

    #[test]
    fn test_capacity_bounds_immediate_acquisitions() {
        let (limiter, _clock) = limiter_with_mock_clock(4.0);

        for i in 0..4 {
            assert!(limiter.try_acquire(), "token {} should be available", i);
        }
        assert!(!limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_refill_over_time() {
        let (limiter, clock) = limiter_with_mock_clock(2.0);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        clock.advance(Duration::from_millis(250));
        assert!(!limiter.try_acquire());

        clock.advance(Duration::from_millis(250));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_refill_capped_at_capacity() {
        let (limiter, clock) = limiter_with_mock_clock(3.0);
        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }

        clock.advance(Duration::from_secs(3600));
        assert_eq!(limiter.available_tokens(), 3.0);
    }

    #[test]
    fn test_tokens_never_negative() {
        let (limiter, clock) = limiter_with_mock_clock(1.0);
        for _ in 0..10 {
            limiter.try_acquire();
            assert!(limiter.available_tokens() >= 0.0);
        }
        clock.advance(Duration::from_millis(100));
        assert!(limiter.available_tokens() <= limiter.capacity());
    }

    #[test]
    fn test_clock_moving_backwards_is_ignored() {
        let start = Instant::now() + Duration::from_secs(10);
        let clock = Arc::new(MockClock::new(start));
        let limiter = RateLimiter::with_clock(1.0, 1.0, clock.clone()).unwrap();
        assert!(limiter.try_acquire());

        clock.set(start - Duration::from_secs(5));
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.available_tokens(), 0.0);
    }

    #[tokio::test]
    async fn test_wait_cancelled_consumes_no_token() {
        let (limiter, _clock) = limiter_with_mock_clock(2.0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(limiter.wait(&cancel).await, Err(Cancelled));
        assert_eq!(limiter.available_tokens(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_blocks_when_exhausted() {
        let (limiter, _clock) = limiter_with_mock_clock(3.0);
        let cancel = CancellationToken::new();

        for _ in 0..3 {
            limiter.wait(&cancel).await.unwrap();
        }

        // Mock time never moves, so the fourth caller stays blocked
        let blocked = tokio::time::timeout(Duration::from_secs(5), limiter.wait(&cancel)).await;
        assert!(blocked.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_while_blocked() {
        let (limiter, clock) = limiter_with_mock_clock(1.0);
        let cancel = CancellationToken::new();
        limiter.wait(&cancel).await.unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        assert_eq!(limiter.wait(&cancel).await, Err(Cancelled));

        // The refill that arrives later is still there for the next caller
        clock.advance(Duration::from_secs(1));
        assert_eq!(limiter.available_tokens(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sequence_at_two_per_second() {
        let limiter = RateLimiter::new(2.0).unwrap();
        let cancel = CancellationToken::new();

        let start = tokio::time::Instant::now();
        limiter.wait(&cancel).await.unwrap();
        limiter.wait(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));

        let third = tokio::time::Instant::now();
        limiter.wait(&cancel).await.unwrap();
        let waited = third.elapsed();
        assert!(
            waited >= Duration::from_millis(450) && waited < Duration::from_millis(600),
            "third wait took {:?}",
            waited
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_all_admitted() {
        let limiter = Arc::new(RateLimiter::new(5.0).unwrap());
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();

        let mut handles = vec![];
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move { limiter.wait(&cancel).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(()));
        }

        // Five come from the initial burst, five more need a full second of refill
        assert!(start.elapsed() >= Duration::from_millis(800));
        assert!(limiter.available_tokens() < 1.0);
    }
}

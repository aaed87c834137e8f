//! Mock clock for testing.

use crate::application::ports::Clock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clock that only moves when a test moves it.
///
/// Lets tests drive token refill and cache expiry deterministically.
/// Clones share the same underlying time, so advancing one clone advances all.
///
/// # Examples
///
/// ```
/// use catalog_dispatch::infrastructure::mocks::MockClock;
/// use catalog_dispatch::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
/// assert_eq!(clock.now(), start);
///
/// clock.advance(Duration::from_millis(500));
/// assert_eq!(clock.elapsed(), Duration::from_millis(500));
///
/// clock.set(start + Duration::from_secs(100));
/// assert_eq!(clock.now(), start + Duration::from_secs(100));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    current_time: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration and return the new time.
    pub fn advance(&self, duration: Duration) -> Instant {
        let mut time = self.current_time.lock();
        *time += duration;
        *time
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.current_time.lock() = instant;
    }

    /// Time moved since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.current_time.lock().saturating_duration_since(self.start)
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current_time.lock()
    }
}

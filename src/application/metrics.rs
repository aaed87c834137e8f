//! Observability metrics for request dispatch.
//!
//! Counters describing how logical calls were served: from cache, by how many
//! attempts, and how they ended.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Dispatch statistics shared by all clones of a dispatcher.
///
/// All metrics use atomic operations for thread-safe updates and reads.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    /// Attempts handed to the upstream, first tries and retries alike
    attempts: AtomicU64,
    /// Backoff sleeps started
    retries: AtomicU64,
    /// Logical calls that ended in a classified error
    failures: AtomicU64,
    /// Logical calls that ended in cancellation
    cancellations: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_attempt(&self) {
        self.inner.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.inner.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.inner.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancellation(&self) {
        self.inner.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Calls answered from the cache.
    pub fn cache_hits(&self) -> u64 {
        self.inner.cache_hits.load(Ordering::Relaxed)
    }

    /// Calls that had to go upstream.
    pub fn cache_misses(&self) -> u64 {
        self.inner.cache_misses.load(Ordering::Relaxed)
    }

    /// Upstream attempts made.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    /// Retries scheduled.
    pub fn retries(&self) -> u64 {
        self.inner.retries.load(Ordering::Relaxed)
    }

    /// Calls that returned a classified error.
    pub fn failures(&self) -> u64 {
        self.inner.failures.load(Ordering::Relaxed)
    }

    /// Calls aborted by cancellation.
    pub fn cancellations(&self) -> u64 {
        self.inner.cancellations.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits(),
            cache_misses: self.cache_misses(),
            attempts: self.attempts(),
            retries: self.retries(),
            failures: self.failures(),
            cancellations: self.cancellations(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.cache_hits.store(0, Ordering::Relaxed);
        self.inner.cache_misses.store(0, Ordering::Relaxed);
        self.inner.attempts.store(0, Ordering::Relaxed);
        self.inner.retries.store(0, Ordering::Relaxed);
        self.inner.failures.store(0, Ordering::Relaxed);
        self.inner.cancellations.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Calls answered from the cache
    pub cache_hits: u64,
    /// Calls that had to go upstream
    pub cache_misses: u64,
    /// Upstream attempts made, first tries and retries alike
    pub attempts: u64,
    /// Backoff sleeps started
    pub retries: u64,
    /// Calls that ended in a classified error
    pub failures: u64,
    /// Calls that ended in cancellation
    pub cancellations: u64,
}

impl MetricsSnapshot {
    /// Fraction of cache lookups that hit (0.0 to 1.0).
    ///
    /// Returns 0.0 if no lookups happened.
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits.saturating_add(self.cache_misses);
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    /// Average upstream attempts per cache miss.
    pub fn attempts_per_miss(&self) -> f64 {
        if self.cache_misses == 0 {
            0.0
        } else {
            self.attempts as f64 / self.cache_misses as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_and_snapshot() {
        let metrics = Metrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_attempt();
        metrics.record_attempt();
        metrics.record_attempt();
        metrics.record_retry();
        metrics.record_failure();
        metrics.record_cancellation();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 2);
        assert_eq!(snapshot.attempts, 3);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.cancellations, 1);
    }

    #[test]
    fn test_cache_hit_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().cache_hit_rate(), 0.0);

        metrics.record_cache_hit();
        metrics.record_cache_miss();
        assert!((metrics.snapshot().cache_hit_rate() - 0.5).abs() < f64::EPSILON);

        metrics.record_cache_hit();
        metrics.record_cache_hit();
        assert!((metrics.snapshot().cache_hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_attempts_per_miss() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().attempts_per_miss(), 0.0);

        metrics.record_cache_miss();
        metrics.record_attempt();
        metrics.record_attempt();
        metrics.record_attempt();
        assert!((metrics.snapshot().attempts_per_miss() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_cache_hit();
        metrics.record_attempt();
        metrics.record_failure();

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_metrics_clone_shares_counters() {
        let metrics1 = Metrics::new();
        metrics1.record_attempt();

        let metrics2 = metrics1.clone();
        metrics2.record_attempt();

        assert_eq!(metrics1.attempts(), 2);
        assert_eq!(metrics2.attempts(), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_cache_miss();
                    m.record_attempt();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.cache_misses(), 1000);
        assert_eq!(metrics.attempts(), 1000);
    }
}

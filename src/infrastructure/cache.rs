//! In-memory TTL cache adapter.
//!
//! Provides the default implementation of the `Cache` port: a concurrent,
//! sharded map with lazy expiry.

use crate::application::ports::{Cache, Clock};
use crate::infrastructure::clock::SystemClock;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached payload and the instant it stops being served.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe in-memory cache backed by DashMap.
///
/// Reads of different keys proceed in parallel; a write locks only the shard
/// holding its key, and every critical section is O(1).
///
/// Expired entries are not swept in the background. They stop being served
/// the moment the clock reaches their expiry and are physically replaced by
/// the next `set` for the same key, or dropped by [`MemoryCache::purge_expired`].
///
/// There is no capacity bound beyond TTL expiry.
///
/// # Example
/// ```
/// use catalog_dispatch::{Cache, MemoryCache};
/// use std::time::Duration;
///
/// let cache = MemoryCache::new();
/// cache.set("product:USD:C1", b"{}".to_vec(), Duration::from_secs(300));
/// assert_eq!(cache.get("product:USD:C1"), Some(b"{}".to_vec()));
///
/// cache.delete("product:USD:C1");
/// assert_eq!(cache.get("product:USD:C1"), None);
/// ```
#[derive(Debug)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry, RandomState>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// Create an empty cache using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Create an empty cache reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            clock,
        }
    }

    /// Number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        entry.is_live(now).then(|| entry.payload.clone())
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let now = self.clock.now();
        // An unrepresentable expiry is as good as never expiring.
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(Duration::from_secs(u32::MAX as u64)))
            .unwrap_or(now);

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload: value,
                expires_at,
            },
        );
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Port for obtaining current time.
///
/// This abstraction allows the limiter and the cache to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for the result cache consulted by the dispatcher.
///
/// Entries expire lazily: once the current time reaches an entry's expiry,
/// `get` reports a miss even if the entry is still physically stored.
/// Any implementation honoring that contract (in-memory, external store) can
/// be injected into a dispatcher. Infrastructure provides `MemoryCache`.
pub trait Cache: Send + Sync + Debug {
    /// Look up a live entry.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key` for `ttl`, replacing any prior entry.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);

    /// Remove the entry for `key`, if any.
    fn delete(&self, key: &str);

    /// Remove all entries.
    fn clear(&self);
}

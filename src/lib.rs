//! # catalog-dispatch
//!
//! Rate-limited, retrying, caching dispatch for outbound catalog lookups.
//!
//! A [`Dispatcher`] wraps every call to a remote catalog API. For one logical
//! call it checks a TTL cache, takes a token from a shared token bucket, runs the
//! caller's attempt function, classifies the outcome into a [`DomainError`] kind
//! and retries transient failures with exponential backoff. The whole call can
//! be aborted through a [`CancellationToken`].
//!
//! The HTTP transport itself is out of scope: callers supply an attempt function
//! that performs one round-trip and reports an [`AttemptOutcome`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_dispatch::{
//!     AttemptOutcome, CancellationToken, Dispatcher, DomainError, RequestKey, RetryPolicy,
//! };
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::builder()
//!     .with_requests_per_second(5.0)
//!     .with_retry_policy(RetryPolicy::default())
//!     .build()?;
//!
//! let key = RequestKey::new("GET", "/products/detail")
//!     .with_scope("USD")
//!     .with_param("sku", "C12345");
//! let cancel = CancellationToken::new();
//!
//! let result = dispatcher
//!     .execute(&key.to_string(), Duration::from_secs(300), &cancel, || async {
//!         // Perform the HTTP round-trip here
//!         AttemptOutcome::ok(br#"{"sku":"C12345"}"#.to_vec())
//!     })
//!     .await;
//!
//! match result {
//!     Ok(payload) => println!("{} bytes", payload.len()),
//!     Err(DomainError::NotFound { identifier }) => println!("no such part: {}", identifier),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! - **Cache**: a live entry for the key is returned without touching the
//!   limiter. Successful payloads are stored for the caller's TTL; errors are
//!   never cached.
//! - **Admission**: every attempt, retries included, takes one token. Tokens
//!   refill continuously at the configured rate up to the burst capacity.
//! - **Classification**: `200` succeeds; `404`, `429` and `400` map to
//!   `NotFound`, `RateLimited` and `InvalidInput`; anything else is `Unknown`.
//! - **Retry**: only statuses `429`, `503` and `504` are retried. The delay
//!   before retry `n` is `min(initial * multiplier^n, max)`.
//! - **Cancellation**: observed while waiting for a token, during an attempt
//!   and during a backoff sleep. It always wins over a classified error.
//!
//! ## Observability
//!
//! Dispatch decisions are logged through `tracing` (retries at `WARN`, the rest
//! at `DEBUG`/`TRACE`). Counters are available without a subscriber:
//!
//! ```rust
//! # use catalog_dispatch::Dispatcher;
//! let dispatcher = Dispatcher::new();
//! let snapshot = dispatcher.metrics().snapshot();
//! println!("hit rate: {:.2}", snapshot.cache_hit_rate());
//! println!("attempts per miss: {:.2}", snapshot.attempts_per_miss());
//! ```
//!
//! ## Custom Caches
//!
//! Any type implementing [`Cache`] can replace the in-memory default via
//! [`DispatcherBuilder::with_cache`]; [`DispatcherBuilder::without_cache`]
//! disables caching entirely.

#![warn(missing_docs)]

// Domain layer - pure types and rules
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - adapters and construction
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    attempt::{AttemptOutcome, TransportError},
    error::{classify, is_success, Cancelled, DomainError},
    key::RequestKey,
    retry::{RetryPolicy, RetryPolicyError, RETRYABLE_STATUSES},
};

pub use application::{
    dispatcher::Dispatcher,
    limiter::{LimiterError, RateLimiter},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Cache, Clock},
    suspend::cancellable_sleep,
};

pub use infrastructure::{
    builder::{BuildError, DispatcherBuilder, DEFAULT_REQUESTS_PER_SECOND},
    cache::MemoryCache,
    clock::SystemClock,
};

pub use tokio_util::sync::CancellationToken;

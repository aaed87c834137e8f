//! Domain layer - pure types and functions with no runtime dependencies.
//!
//! This layer contains the core concepts of the request pipeline:
//! - Domain error taxonomy and the status classifier
//! - Retry policy (backoff schedule, retryable statuses)
//! - Attempt outcomes
//! - Request cache keys
//!
//! Nothing here touches clocks, locks or the async runtime.

pub mod attempt;
pub mod error;
pub mod key;
pub mod retry;

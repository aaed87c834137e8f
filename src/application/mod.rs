//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain rules at runtime:
//! - Rate limiter (admission control)
//! - Dispatcher (cache, admission, attempts and retries for one call)
//! - Metrics (dispatch counters)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod dispatcher;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod suspend;

//! Infrastructure layer - external adapters and construction.
//!
//! This layer provides adapters for:
//! - Clock abstraction (tokio-aware system time vs mock)
//! - Cache implementations (sharded in-memory map)
//! - Dispatcher builder (default wiring and validation)

pub mod builder;
pub mod cache;
pub mod clock;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for exercising
/// dispatch behavior.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// catalog-dispatch = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;

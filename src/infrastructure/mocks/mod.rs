//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters and for the
//! upstream attempt function, enabling controlled testing of dispatch logic.

pub mod attempt;
pub mod clock;
pub mod layer;

pub use attempt::ScriptedAttempt;
pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};

//! Scripted attempt function for exercising the dispatcher.

use crate::domain::attempt::AttemptOutcome;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Step {
    Status(u16, Vec<u8>),
    Transport(u16, String),
}

impl Step {
    fn outcome(&self) -> AttemptOutcome {
        match self {
            Step::Status(status, payload) => AttemptOutcome::with_status(*status, payload.clone()),
            Step::Transport(status, message) => {
                AttemptOutcome::transport_failure(*status, message.clone())
            }
        }
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    steps: VecDeque<Step>,
    fallback: Option<Step>,
    calls: Vec<Instant>,
}

/// Replays a fixed sequence of attempt outcomes and records when it was called.
///
/// Once the scripted steps run out, the fallback step (if any) repeats forever;
/// without a fallback the attempt answers `500 script exhausted`.
///
/// # Examples
///
/// ```
/// use catalog_dispatch::infrastructure::mocks::ScriptedAttempt;
///
/// # tokio_test_block_on(async {
/// let attempt = ScriptedAttempt::new()
///     .then_status(503, "busy")
///     .then_status(200, "{}");
///
/// assert_eq!(attempt.call().await.status, 503);
/// assert_eq!(attempt.call().await.status, 200);
/// assert_eq!(attempt.calls(), 2);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedAttempt {
    state: Arc<Mutex<ScriptState>>,
    latency: Duration,
}

impl ScriptedAttempt {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// A script that answers `status` with `payload` on every call.
    pub fn always_status(status: u16, payload: impl Into<Vec<u8>>) -> Self {
        let script = Self::new();
        script.state.lock().fallback = Some(Step::Status(status, payload.into()));
        script
    }

    /// Append a step answering `status` with `payload`.
    pub fn then_status(self, status: u16, payload: impl Into<Vec<u8>>) -> Self {
        self.state
            .lock()
            .steps
            .push_back(Step::Status(status, payload.into()));
        self
    }

    /// Append a step that fails at the transport level.
    pub fn then_transport_error(self, status: u16, message: impl Into<String>) -> Self {
        self.state
            .lock()
            .steps
            .push_back(Step::Transport(status, message.into()));
        self
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Perform one scripted attempt.
    pub fn call(&self) -> impl Future<Output = AttemptOutcome> + Send + 'static {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(tokio::time::Instant::now().into_std());
            match state.steps.pop_front().or_else(|| state.fallback.clone()) {
                Some(step) => step.outcome(),
                None => AttemptOutcome::with_status(500, "script exhausted"),
            }
        };
        let latency = self.latency;

        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
    }

    /// Number of attempts made so far.
    pub fn calls(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Gaps between consecutive attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .calls
            .windows(2)
            .map(|pair| pair[1].saturating_duration_since(pair[0]))
            .collect()
    }
}

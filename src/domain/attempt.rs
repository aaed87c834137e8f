//! Outcome of a single network exchange.

use crate::domain::error::{classify, is_success, DomainError};
use std::error::Error as StdError;
use std::fmt;

/// Boxed transport failure attached to an attempt.
pub type TransportError = Box<dyn StdError + Send + Sync + 'static>;

/// What one opaque attempt against the upstream produced.
///
/// The dispatcher only looks at the status (for retryability) and at the
/// classification of the whole outcome; the payload is passed through untouched.
pub struct AttemptOutcome {
    /// Transport status code (0 when no response was received)
    pub status: u16,
    /// Raw response payload
    pub payload: Vec<u8>,
    /// Transport-level failure, if any
    pub transport_error: Option<TransportError>,
}

impl AttemptOutcome {
    /// A successful exchange (status 200).
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, payload)
    }

    /// An exchange that completed with the given status.
    pub fn with_status(status: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            payload: payload.into(),
            transport_error: None,
        }
    }

    /// An exchange that failed at the transport level.
    pub fn transport_failure(status: u16, error: impl Into<TransportError>) -> Self {
        Self {
            status,
            payload: Vec::new(),
            transport_error: Some(error.into()),
        }
    }

    /// Message used for classification: the transport error text if present,
    /// otherwise the payload as lossy UTF-8, passed through unmodified.
    pub fn message(&self) -> String {
        match &self.transport_error {
            Some(err) => err.to_string(),
            None => String::from_utf8_lossy(&self.payload).into_owned(),
        }
    }

    /// Classify the outcome, yielding the payload on success.
    ///
    /// A transport error always fails the attempt, even when paired with a
    /// status the classifier would accept. The message is only built on the
    /// failure path.
    pub fn into_result(self) -> Result<Vec<u8>, DomainError> {
        if is_success(self.status) && self.transport_error.is_none() {
            return Ok(self.payload);
        }

        let message = self.message();
        classify(self.status, &message)?;
        Err(DomainError::Unknown {
            code: self.status,
            message,
        })
    }
}

impl fmt::Debug for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptOutcome")
            .field("status", &self.status)
            .field("payload_len", &self.payload.len())
            .field(
                "transport_error",
                &self.transport_error.as_ref().map(|e| e.to_string()),
            )
            .finish()
    }
}

//! Domain error taxonomy and the status-code classifier.
//!
//! Every failed attempt is mapped onto a small, stable set of kinds so callers
//! can pattern-match on the category of a failure without caring about the raw
//! transport status that produced it.

use thiserror::Error;

/// Caller-facing category of a failed catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The upstream has no record for the requested identifier (status 404).
    #[error("not found: {identifier}")]
    NotFound {
        /// Identifier reported by the upstream.
        identifier: String,
    },
    /// The upstream refused the request because of its own rate limits (status 429).
    #[error("rate limited by upstream")]
    RateLimited,
    /// The upstream rejected the request parameters (status 400).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Upstream explanation of the rejection.
        message: String,
    },
    /// Any other non-success status.
    #[error("upstream error (code {code}): {message}")]
    Unknown {
        /// Raw status code.
        code: u16,
        /// Upstream or transport message.
        message: String,
    },
    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error is the cancellation kind.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Raw status code carried by an `Unknown` error.
    pub fn code(&self) -> Option<u16> {
        match self {
            DomainError::Unknown { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Cancellation signal returned by the suspension points (token wait, backoff sleep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

impl From<Cancelled> for DomainError {
    fn from(_: Cancelled) -> Self {
        DomainError::Cancelled
    }
}

/// Whether `status` is the one status the classifier accepts.
pub fn is_success(status: u16) -> bool {
    status == 200
}

/// Map a transport status and message onto the domain taxonomy.
///
/// Only status 200 counts as success (see [`is_success`]). The classification
/// says nothing about whether the failure is worth retrying; see
/// [`RetryPolicy::is_retryable`](crate::domain::retry::RetryPolicy::is_retryable).
pub fn classify(status: u16, message: &str) -> Result<(), DomainError> {
    match status {
        status if is_success(status) => Ok(()),
        404 => Err(DomainError::NotFound {
            identifier: message.to_string(),
        }),
        429 => Err(DomainError::RateLimited),
        400 => Err(DomainError::InvalidInput {
            message: message.to_string(),
        }),
        code => Err(DomainError::Unknown {
            code,
            message: message.to_string(),
        }),
    }
}

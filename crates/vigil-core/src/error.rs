//! Shared error type across vigil crates.

use thiserror::Error;

use crate::metric::MetricKind;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input or configuration.
    BadRequest,
    /// The request did not finish within its deadline.
    Timeout,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VigilError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("duplicate metric {name}: {detail}")]
    DuplicateMetric { name: String, detail: String },
    #[error("invalid counter delta: {0} (must be non-negative)")]
    InvalidDelta(i64),
    #[error("counter overflow: {name}")]
    CounterOverflow { name: String },
    #[error("unknown instrument handle")]
    UnknownHandle,
    #[error("instrument kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: MetricKind,
        found: MetricKind,
    },
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("handler failed: {0}")]
    Handler(String),
    #[error("request timed out")]
    Timeout,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl VigilError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            VigilError::BadRequest(_) => ClientCode::BadRequest,
            VigilError::Timeout => ClientCode::Timeout,
            _ => ClientCode::Internal,
        }
    }

    /// Registry errors indicate broken instrumentation setup, not a client fault.
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            VigilError::DuplicateMetric { .. }
                | VigilError::InvalidDelta(_)
                | VigilError::CounterOverflow { .. }
                | VigilError::UnknownHandle
                | VigilError::KindMismatch { .. }
                | VigilError::InvalidName(_)
                | VigilError::InvalidBuckets(_)
                | VigilError::InvalidValue(_)
        )
    }
}

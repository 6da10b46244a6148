//! Error types for Divvy operations

use crate::identity::InvalidKey;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Validation errors. Raised before any I/O takes place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid {label} ID: {source}")]
    InvalidKey {
        label: &'static str,
        source: InvalidKey,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// An HTTP-shaped failure reported by a transport.
///
/// `status` is `None` when no response was received at all (connection
/// refused, timeout, undecodable body).
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub body: Option<Value>,
    pub message: String,
}

impl TransportError {
    /// A response with a non-success status code.
    pub fn http(status: u16, body: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body,
            message: message.into(),
        }
    }

    /// A failure without any response from the server.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// True for 4xx responses.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(400..=499))
    }

    /// True for 5xx responses.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(500..=599))
    }

    /// The `error` (or `message`) string of a structured response body, trimmed.
    pub fn payload_message(&self) -> Option<String> {
        let body = self.body.as_ref()?;
        ["error", "message"]
            .iter()
            .filter_map(|field| body.get(field).and_then(Value::as_str))
            .map(str::trim)
            .find(|message| !message.is_empty())
            .map(str::to_string)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "Network error: {}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Classification of a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Caller mistake, detected before I/O.
    Validation,
    /// Authoritative 4xx outcome; stale data is discarded.
    NotFound,
    /// 5xx or network failure; last good data is kept.
    Transient,
}

/// A classified load failure.
///
/// `Display` yields the user-visible message: verbatim for validation and
/// client errors, the fixed per-operation fallback for transient ones. The
/// unredacted transport error stays available through [`LoadError::details`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    NotFound {
        message: String,
        #[source]
        details: TransportError,
    },

    #[error("{message}")]
    Transient {
        message: String,
        #[source]
        details: TransportError,
    },
}

impl LoadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Transient { .. } => FailureKind::Transient,
        }
    }

    /// The message surfaced on the user-visible error signal.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// The original transport failure, if the error came from I/O.
    pub fn details(&self) -> Option<&TransportError> {
        match self {
            Self::Validation(_) => None,
            Self::NotFound { details, .. } | Self::Transient { details, .. } => Some(details),
        }
    }
}

/// Master error type for Divvy operations.
#[derive(Debug, Clone, Error)]
pub enum DivvyError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for Divvy operations.
pub type DivvyResult<T> = Result<T, DivvyError>;

// =============================================================================
// TESTS
// =============================================================================

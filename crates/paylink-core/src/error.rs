//! Error Types
//!
//! Two layers: [`PaymentError`] is what code returns internally, [`ErrorDetail`]
//! is the frozen shape handed to callers inside a tool response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for payment-link operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Stable error classification exposed to tool callers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    MissingCredentials,
    UnknownProvider,
    AuthenticationFailed,
    RequestRejected,
    UpstreamProtocolError,
    UpstreamUnavailable,
}

impl ErrorKind {
    /// Only transient upstream faults are worth retrying
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::UpstreamUnavailable)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::MissingCredentials => "MissingCredentials",
            Self::UnknownProvider => "UnknownProvider",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::RequestRejected => "RequestRejected",
            Self::UpstreamProtocolError => "UpstreamProtocolError",
            Self::UpstreamUnavailable => "UpstreamUnavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment-link error types
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Tool arguments failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// One or more credential fields are absent
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Provider name is not registered
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Gateway refused the dealer credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Gateway accepted the request but declined it on business rules
    #[error("Request rejected: {0}")]
    RequestRejected(String),

    /// Gateway answered with something we cannot interpret
    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),

    /// Gateway unreachable, timed out, or temporarily failing
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl PaymentError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::MissingCredentials(_) => ErrorKind::MissingCredentials,
            Self::UnknownProvider(_) => ErrorKind::UnknownProvider,
            Self::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            Self::RequestRejected(_) => ErrorKind::RequestRejected,
            Self::UpstreamProtocol(_) => ErrorKind::UpstreamProtocolError,
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retriable()
    }

    /// The message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::MissingCredentials(msg)
            | Self::UnknownProvider(msg)
            | Self::AuthenticationFailed(msg)
            | Self::RequestRejected(msg)
            | Self::UpstreamProtocol(msg)
            | Self::UpstreamUnavailable(msg) => msg,
        }
    }
}

/// Structured failure carried in a tool response. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    kind: ErrorKind,
    message: String,
    retriable: bool,
}

impl ErrorDetail {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retriable: kind.is_retriable(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retriable(&self) -> bool {
        self.retriable
    }
}

impl From<PaymentError> for ErrorDetail {
    fn from(err: PaymentError) -> Self {
        Self::new(err.kind(), err.message())
    }
}

impl From<&PaymentError> for ErrorDetail {
    fn from(err: &PaymentError) -> Self {
        Self::new(err.kind(), err.message())
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

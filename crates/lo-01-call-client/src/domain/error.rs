//! Remote call error taxonomy.
//!
//! Codes follow the hosted-functions backend's canonical status names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical error codes reported by the backend or derived locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    // Transient
    Unavailable,
    DeadlineExceeded,
    /// Local timer fired before the remote call settled.
    Timeout,
    Internal,
    Unknown,
    Network,
    ResourceExhausted,
    Aborted,

    // Terminal
    PermissionDenied,
    InvalidArgument,
    NotFound,
    Unauthenticated,
    AlreadyExists,
    FailedPrecondition,
    OutOfRange,
    Unimplemented,
    Cancelled,
    DataLoss,
}

impl ErrorCode {
    /// Whether a failure with this code is worth another attempt.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Unavailable
                | Self::DeadlineExceeded
                | Self::Timeout
                | Self::Internal
                | Self::Unknown
                | Self::Network
                | Self::ResourceExhausted
                | Self::Aborted
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
            Self::Unknown => "unknown",
            Self::Network => "network",
            Self::ResourceExhausted => "resource-exhausted",
            Self::Aborted => "aborted",
            Self::PermissionDenied => "permission-denied",
            Self::InvalidArgument => "invalid-argument",
            Self::NotFound => "not-found",
            Self::Unauthenticated => "unauthenticated",
            Self::AlreadyExists => "already-exists",
            Self::FailedPrecondition => "failed-precondition",
            Self::OutOfRange => "out-of-range",
            Self::Unimplemented => "unimplemented",
            Self::Cancelled => "cancelled",
            Self::DataLoss => "data-loss",
        }
    }

    /// Derive a code from a free-form message when the transport gave none.
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("timeout") {
            Self::Timeout
        } else if lower.contains("network") {
            Self::Network
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an [`crate::OperationInvoker`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
    /// Explicit override from the backend; `None` means "decide by code".
    pub retryable: Option<bool>,
}

impl RemoteError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: None,
        }
    }

    /// Error without a code; the code is derived from the message.
    ///
    /// Only timeout wording makes a codeless error retryable. The derived
    /// code is for reporting.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let code = ErrorCode::from_message(&message);
        Self {
            retryable: Some(code == ErrorCode::Timeout),
            ..Self::new(code, message)
        }
    }

    /// The backend explicitly marked this failure as final.
    #[must_use]
    pub fn non_retryable(mut self) -> Self {
        self.retryable = Some(false);
        self
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Request timeout after {}ms", after.as_millis()),
        )
    }

    pub fn unavailable(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, details)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, details)
    }

    pub fn permission_denied(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, details)
    }

    pub fn invalid_argument(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, details)
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, details)
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable.unwrap_or_else(|| self.code.is_retryable())
    }
}

/// Client configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    #[error("invalid retry policy: {0}")]
    InvalidRetry(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}

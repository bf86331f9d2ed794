//! Error types for the data cache.

use thiserror::Error;

/// Failures surfaced by [`crate::SwrCache`].
///
/// `Clone` so one failed fetch can be handed to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Keys must be non-empty; this is caller misuse.
    #[error("Cache key must be a non-empty string")]
    EmptyKey,

    /// The fetch function failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Wrap any displayable fetch failure.
    pub fn fetch(reason: impl std::fmt::Display) -> Self {
        Self::Fetch(reason.to_string())
    }
}

/// Key-value backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Backend cannot be used at all.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Backend refused a write (full, read-only).
    #[error("Storage quota exceeded for key {key}")]
    QuotaExceeded { key: String },

    /// A stored record could not be decoded.
    #[error("Corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage I/O error: {0}")]
    Io(String),
}

/// Cache configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid age: {0}")]
    InvalidAge(String),
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),
}

//! Error types for the file cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the file cache.
///
/// Every public cache operation reports failure through one of these
/// variants instead of panicking.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration update rejected (unknown option, wrong type, not an object)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Content could not be represented in the record format
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No cache file exists for the key
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Cache file exists but is not a valid record
    #[error("Corrupt cache file {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Record decoded but its expiry timestamp has passed
    #[error("Key expired: {0}")]
    Expired(String),

    /// Requested expiry resolves to a timestamp earlier than now
    #[error("Expiry timestamp {0} is already in the past")]
    ExpiryInPast(i64),

    /// `replace` found an existing value, but a falsy one
    #[error("Existing value for key {0} is falsy")]
    FalsyValue(String),

    /// Stored content cannot be converted to the requested type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}

impl CacheError {
    /// Wraps an `std::io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for the "nothing usable stored" family of failures.
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            CacheError::NotFound(_) | CacheError::Expired(_) | CacheError::Decode { .. }
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the file cache.
pub type Result<T> = std::result::Result<T, CacheError>;

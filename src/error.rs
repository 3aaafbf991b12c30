//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::cache::NumberKind;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Every variant describes a local, recoverable condition. The store returns
/// these to the caller and never logs or panics on them.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `add` found a live entry for the key
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// Key missing or expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Stored value cannot take the requested increment
    #[error("Type mismatch for key {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The background sweeper could not be started
    #[error("Sweeper error: {0}")]
    Sweeper(#[from] std::io::Error),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    pub(crate) fn type_mismatch(key: &str, expected: &'static str, found: Option<NumberKind>) -> Self {
        CacheError::TypeMismatch {
            key: key.to_string(),
            expected,
            found: found.map_or("non-numeric", NumberKind::name),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

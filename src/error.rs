//! Error types for the fingerprint database
//!
//! One crate-wide error enum covers the store backend, the value codecs,
//! and the catalog/index operations built on top of them.

use thiserror::Error;

/// Errors that can occur in the fingerprint database
#[derive(Error, Debug)]
pub enum DbError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected (checksum mismatch, invalid magic, etc.)
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// Operation referenced a recording id that does not exist
    #[error("Recording not found: {0}")]
    RecordingNotFound(u64),

    /// The id allocator returned an id already present in the catalog.
    /// Indicates a broken atomicity guarantee in the underlying store;
    /// fatal, never retried.
    #[error("Duplicate recording id: {0}")]
    DuplicateRecordingId(u64),

    /// Underlying store failure, propagated uninterpreted
    #[error("Store error: {0}")]
    Store(String),

    /// Malformed fingerprint hash input
    #[error("Invalid fingerprint hash: {0}")]
    InvalidHash(String),
}

impl From<bincode::Error> for DbError {
    fn from(err: bincode::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;

//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A save failed and its transaction was rolled back; the previous tree
    /// is untouched.
    #[error("saving grid for '{owner_key}' failed and was rolled back: {source}")]
    TransactionFailed {
        owner_key: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Schema provisioning error.
    #[error("schema error: {0}")]
    Schema(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("connection lock poisoned")]
    LockPoisoned,
}

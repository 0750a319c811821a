use std::path::PathBuf;

use cidstore_types::{ContextError, TypeError};

/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file could not be created.
    #[error("cannot create store file {}: {source}", .path.display())]
    Initialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage engine could not be opened.
    #[error("connection failure: {0}")]
    Connection(String),

    /// An operation was attempted before `open()`.
    #[error("store is not open")]
    NotOpen,

    /// The requested key was not found.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The storage engine rejected a write on a constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Content read under a derived key does not hash to that key.
    #[error("hash mismatch for {key}: computed {computed}")]
    HashMismatch { key: String, computed: String },

    /// The key is empty or not printable.
    #[error("{0}")]
    InvalidKey(TypeError),

    /// The collection name is not a plain identifier.
    #[error("{0}")]
    InvalidCollection(TypeError),

    /// The operation context was cancelled or expired before the statement was issued.
    #[error("{0}")]
    Context(#[from] ContextError),

    /// Any other error reported by SQLite.
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error outside the storage engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for the expected "key absent" outcome of `get`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Self::ConstraintViolation(err.to_string())
            }
            Some(rusqlite::ErrorCode::CannotOpen) | Some(rusqlite::ErrorCode::NotADatabase) => {
                Self::Connection(err.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

//! Error types shared by every store backend.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed path, root path, or a path of the wrong kind.
    #[error("invalid path {0}")]
    InvalidPath(String),

    /// `create` on a path that is already present.
    #[error("path already exists {0}")]
    PathExists(String),

    /// Collection listing below the root.
    #[error("only root collections supported")]
    OnlyRootCollections,

    /// Iterator options that cannot be combined.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The secret key does not open this store.
    #[error("invalid secret key")]
    InvalidKey,

    /// A stored value failed to decrypt or decode.
    #[error("corrupted document {path}: {reason}")]
    Corrupted { path: String, reason: String },

    /// Another handle in this process holds the store open.
    #[error("store already open at {0}")]
    AlreadyOpen(String),

    /// Operation on a closed store.
    #[error("store is closed")]
    Closed,

    /// Underlying database error.
    #[error("database error: {0}")]
    Database(String),

    /// Backend service error.
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Builds a [`StoreError::Corrupted`].
    pub fn corrupted(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Corrupted {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<sealdb_types::Error> for StoreError {
    fn from(err: sealdb_types::Error) -> Self {
        match err {
            sealdb_types::Error::InvalidPath(p) => Self::InvalidPath(p),
            sealdb_types::Error::InvalidSegment(s) => Self::InvalidPath(s),
        }
    }
}

//! Errors reported by a document service.

use sealdb_store::StoreError;
use thiserror::Error;

/// Result type for document service calls.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors a document service can return.
#[derive(Debug, Error)]
pub enum CloudError {
    /// `create` on an existing document.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// Malformed request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The service could not be reached or failed.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl From<CloudError> for StoreError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::AlreadyExists(path) => StoreError::PathExists(path),
            CloudError::InvalidArgument(msg) => StoreError::InvalidOptions(msg),
            CloudError::Unavailable(msg) => StoreError::Backend(msg),
        }
    }
}

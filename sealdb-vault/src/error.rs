//! Error types for the vault.

use crate::record::Stream;
use sealdb_crypto::CryptoError;
use sealdb_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Sync phase an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Push,
    Pull,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Push => f.write_str("push"),
            Phase::Pull => f.write_str("pull"),
        }
    }
}

/// Errors that can occur in vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The vault has no unlocked master key.
    #[error("vault is locked")]
    Locked,

    /// The vault has not been set up.
    #[error("vault is not set up")]
    NotSetup,

    /// Setup or remote init on a vault that already has state.
    #[error("vault is already set up")]
    AlreadySetup,

    /// No password provision opens the vault.
    #[error("invalid password")]
    InvalidPassword,

    /// No key provision opens the vault.
    #[error("invalid auth key")]
    InvalidKey,

    /// Password below the minimum length.
    #[error("password too short (minimum {min} characters)")]
    PasswordTooShort { min: usize },

    /// Item or provision id that is empty or contains `/`.
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// Unknown provision id.
    #[error("provision not found: {0}")]
    ProvisionNotFound(String),

    /// Deprovisioning would leave no way to unlock.
    #[error("cannot remove the last provision")]
    LastProvision,

    /// Sync without a remote.
    #[error("no remote set")]
    NoRemote,

    /// Sync before a remote key exists.
    #[error("no remote key")]
    NoRemoteKey,

    /// A remote record skipped a sequence number.
    #[error("out of order: expected sequence {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    /// The operation was cancelled.
    #[error("sync cancelled")]
    Cancelled,

    /// A sync step failed.
    #[error(
        "{phase} failed ({stream}): {source}",
        stream = .stream.map_or("unknown", Stream::as_str)
    )]
    Sync {
        phase: Phase,
        stream: Option<Stream>,
        #[source]
        source: Box<VaultError>,
    },

    /// The remote rejected or failed a request.
    #[error("remote error: {0}")]
    Remote(String),

    /// A stored or received record could not be decoded.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A blocking task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Crypto error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// Wraps an error with the sync phase and stream it happened in.
    ///
    /// Cancellation and ordering errors are returned as they are.
    pub(crate) fn during(
        phase: Phase,
        stream: Option<Stream>,
    ) -> impl FnOnce(VaultError) -> VaultError {
        move |err| match err {
            VaultError::Cancelled | VaultError::OutOfOrder { .. } | VaultError::Sync { .. } => err,
            other => VaultError::Sync {
                phase,
                stream,
                source: Box::new(other),
            },
        }
    }

    /// Returns true for [`VaultError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VaultError::Cancelled)
    }
}

impl<T> From<std::sync::PoisonError<T>> for VaultError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        VaultError::Store(StoreError::LockPoisoned)
    }
}

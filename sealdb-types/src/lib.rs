//! Core type definitions for SealDB.
//!
//! This crate defines the backend-agnostic types shared by every store:
//! - Paths (`/collection/key/...`) and their canonical ordering
//! - Documents, structured field values and collections
//! - Hybrid logical timestamps and the clocks that issue them
//!
//! Storage behavior lives in `sealdb-store` and the backend crates.

mod clock;
mod document;
mod path;
mod timestamp;

pub use clock::{Clock, SystemClock, TestClock};
pub use document::{Collection, Document, DocumentData, Fields, Value};
pub use path::Path;
pub use timestamp::HybridTimestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid path {0}")]
    InvalidPath(String),

    #[error("invalid path segment {0:?}")]
    InvalidSegment(String),
}

//! Options recognized by writes, iterators and the change feed.

use crate::error::{StoreError, StoreResult};

/// Options for [`DocumentStore::set`](crate::DocumentStore::set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge the written fields into the existing ones instead of replacing
    /// them. A write without a payload keeps the existing payload.
    pub merge_all: bool,
}

impl SetOptions {
    /// Replace the document.
    pub fn replace() -> Self {
        Self::default()
    }

    /// Merge into the existing document.
    pub fn merge() -> Self {
        Self { merge_all: true }
    }
}

/// Options for document iteration.
///
/// `prefix` and `start_after` are keys relative to the iterated collection
/// (`key1` for `/test/key1`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterOptions {
    /// Only keys with this prefix. Iteration stops at the first key past it.
    pub prefix: Option<String>,
    /// Omit payloads.
    pub no_data: bool,
    /// Return at most this many documents.
    pub limit: Option<usize>,
    /// Start after this key (exclusive).
    pub start_after: Option<String>,
    /// Descending key order.
    pub reverse: bool,
}

impl IterOptions {
    /// Default options: every document, ascending, with payloads.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn no_data(mut self) -> Self {
        self.no_data = true;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn start_after(mut self, key: impl Into<String>) -> Self {
        self.start_after = Some(key.into());
        self
    }

    #[must_use]
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Rejects combinations that assume ascending key order.
    pub fn validate(&self) -> StoreResult<()> {
        if self.reverse && self.prefix.is_some() {
            return Err(StoreError::InvalidOptions(
                "prefix requires ascending order".to_string(),
            ));
        }
        if self.reverse && self.start_after.is_some() {
            return Err(StoreError::InvalidOptions(
                "start_after requires ascending order".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute key where a scan of `collection_prefix` begins, and whether
    /// that key itself is excluded.
    pub fn scan_start(&self, collection_prefix: &str) -> (String, bool) {
        match (&self.start_after, &self.prefix) {
            (Some(after), Some(prefix)) if prefix.as_str() > after.as_str() => {
                (format!("{collection_prefix}{prefix}"), false)
            }
            (Some(after), _) => (format!("{collection_prefix}{after}"), true),
            (None, Some(prefix)) => (format!("{collection_prefix}{prefix}"), false),
            (None, None) => (collection_prefix.to_string(), false),
        }
    }

    /// Absolute prefix every returned key must share.
    pub fn scan_prefix(&self, collection_prefix: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{collection_prefix}{prefix}"),
            None => collection_prefix.to_string(),
        }
    }
}

/// Order of a change-feed read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

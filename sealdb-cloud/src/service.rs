//! The native contract of a hosted document service.
//!
//! Documents live in collections addressed by path (`/test0`,
//! `/vaults/abc/records`) and are identified by an id within it. Queries order
//! by id and page with `start_at`/`start_after` cursors; there is no prefix
//! query, so callers bound prefix scans themselves.

use crate::error::CloudResult;
use sealdb_store::Direction;
use sealdb_types::{Fields, HybridTimestamp};

/// A document as the service returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDocument {
    pub id: String,
    pub fields: Fields,
    pub create_time: HybridTimestamp,
    pub update_time: HybridTimestamp,
}

/// A page request against one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    /// Order by id.
    pub order: Direction,
    /// First id to return (inclusive), in query order.
    pub start_at: Option<String>,
    /// Id to resume after (exclusive), in query order.
    pub start_after: Option<String>,
    /// Only documents created after this time.
    pub created_after: Option<HybridTimestamp>,
    /// Only documents created before this time.
    pub created_before: Option<HybridTimestamp>,
    /// Page size. Zero means no cap.
    pub limit: usize,
}

impl Query {
    /// All documents of `collection`, ascending by id.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }
}

/// A hosted document service.
pub trait DocumentService: Send + Sync {
    /// Fetches one document.
    fn get(&self, collection: &str, id: &str) -> CloudResult<Option<ServiceDocument>>;

    /// Creates a document; fails with `AlreadyExists` if present.
    fn create(&self, collection: &str, id: &str, fields: Fields) -> CloudResult<ServiceDocument>;

    /// Writes a document. With `merge`, the given fields are merged into the
    /// existing ones.
    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> CloudResult<ServiceDocument>;

    /// Deletes a document. Returns false if it was absent.
    fn delete(&self, collection: &str, id: &str) -> CloudResult<bool>;

    /// Runs a query and returns one page.
    fn query(&self, query: &Query) -> CloudResult<Vec<ServiceDocument>>;

    /// Paths of every collection holding at least one document, sorted.
    fn collection_ids(&self) -> CloudResult<Vec<String>>;

    /// Atomically adds `by` to a named counter and returns the new value.
    /// Adding zero reads the counter.
    fn increment(&self, counter: &str, by: u64) -> CloudResult<u64>;
}

//! Document store contract for SealDB.
//!
//! Every backend (the encrypted engine, the cloud adapter and the in-memory
//! [`MemStore`]) implements [`DocumentStore`]:
//!
//! - create/set/get/delete on document paths
//! - ordered, releasable iteration over collections ([`DocumentIterator`])
//! - a per-collection change feed with timestamp cursors ([`ChangeIterator`])
//!
//! [`spew`] renders an iterator as `<path> <payload>` lines for inspection.

mod change;
mod error;
mod iterator;
mod memory;
mod options;
mod paths;
mod spew;
mod store;

pub use change::{Change, ChangeIterator, changes_from_iterator};
pub use error::{StoreError, StoreResult};
pub use iterator::{
    CollectionIterator, CollectionList, DocumentIterator, DocumentList, collect_collections,
    collect_documents,
};
pub use memory::MemStore;
pub use options::{Direction, IterOptions, SetOptions};
pub use paths::{change_path, collection_path, document_path, root_parent};
pub use spew::{spew, spew_out};
pub use store::DocumentStore;

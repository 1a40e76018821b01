//! Lazy, releasable sequences over documents and collections.

use crate::error::StoreResult;
use sealdb_types::{Collection, Document};

/// Iterator over documents.
///
/// `next` returns `Ok(None)` at the end, and keeps returning it. `release`
/// frees backend resources; it is idempotent and implementations also run it
/// on drop, so breaking out of a loop early is safe.
pub trait DocumentIterator: Send {
    /// Next document, or `None` at the end.
    fn next(&mut self) -> StoreResult<Option<Document>>;

    /// Releases backend resources.
    fn release(&mut self);
}

/// Iterator over root collections, sorted by path.
pub trait CollectionIterator: Send {
    /// Next collection, or `None` at the end.
    fn next(&mut self) -> StoreResult<Option<Collection>>;

    /// Releases backend resources.
    fn release(&mut self);
}

/// Drains a document iterator and releases it.
pub fn collect_documents(iter: &mut dyn DocumentIterator) -> StoreResult<Vec<Document>> {
    let mut docs = Vec::new();
    let result = loop {
        match iter.next() {
            Ok(Some(doc)) => docs.push(doc),
            Ok(None) => break Ok(docs),
            Err(e) => break Err(e),
        }
    };
    iter.release();
    result
}

/// Drains a collection iterator and releases it.
pub fn collect_collections(iter: &mut dyn CollectionIterator) -> StoreResult<Vec<Collection>> {
    let mut cols = Vec::new();
    let result = loop {
        match iter.next() {
            Ok(Some(col)) => cols.push(col),
            Ok(None) => break Ok(cols),
            Err(e) => break Err(e),
        }
    };
    iter.release();
    result
}

/// Document iterator over an already materialized list.
#[derive(Debug, Default)]
pub struct DocumentList {
    docs: std::vec::IntoIter<Document>,
}

impl DocumentList {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs: docs.into_iter(),
        }
    }
}

impl DocumentIterator for DocumentList {
    fn next(&mut self) -> StoreResult<Option<Document>> {
        Ok(self.docs.next())
    }

    fn release(&mut self) {
        self.docs = Vec::new().into_iter();
    }
}

impl Drop for DocumentList {
    fn drop(&mut self) {
        self.release();
    }
}

/// Collection iterator over an already materialized list.
#[derive(Debug, Default)]
pub struct CollectionList {
    cols: std::vec::IntoIter<Collection>,
}

impl CollectionList {
    /// Sorts and deduplicates `cols`.
    pub fn new(mut cols: Vec<Collection>) -> Self {
        cols.sort();
        cols.dedup();
        Self {
            cols: cols.into_iter(),
        }
    }
}

impl CollectionIterator for CollectionList {
    fn next(&mut self) -> StoreResult<Option<Collection>> {
        Ok(self.cols.next())
    }

    fn release(&mut self) {
        self.cols = Vec::new().into_iter();
    }
}

impl Drop for CollectionList {
    fn drop(&mut self) {
        self.release();
    }
}

//! The document store contract shared by every backend.

use crate::change::ChangeIterator;
use crate::error::StoreResult;
use crate::iterator::{
    CollectionIterator, DocumentIterator, collect_collections, collect_documents,
};
use crate::options::{Direction, IterOptions, SetOptions};
use crate::paths::collection_path;
use sealdb_types::{Collection, Document, DocumentData, HybridTimestamp, Path};

/// Path-addressed document storage.
///
/// Paths are normalized on input: the leading `/` is optional. Reads and
/// writes need a document path; the root and collection paths fail with
/// [`StoreError::InvalidPath`](crate::StoreError::InvalidPath).
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document. Fails with `PathExists` if present.
    fn create(&self, path: &str, data: DocumentData) -> StoreResult<()>;

    /// Inserts or updates a document, keeping its `created_at`.
    fn set(&self, path: &str, data: DocumentData, opts: SetOptions) -> StoreResult<()>;

    /// Returns the document, if present.
    fn get(&self, path: &str) -> StoreResult<Option<Document>>;

    /// Returns true if the document is present.
    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.get(path)?.is_some())
    }

    /// Returns the present documents among `paths`, in the given order.
    fn get_all(&self, paths: &[&str]) -> StoreResult<Vec<Document>> {
        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(doc) = self.get(path)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Deletes a document. Returns false if it was absent.
    fn delete(&self, path: &str) -> StoreResult<bool>;

    /// Deletes every present document among `paths`.
    fn delete_all(&self, paths: &[&str]) -> StoreResult<()> {
        for path in paths {
            self.delete(path)?;
        }
        Ok(())
    }

    /// Iterates the documents below a collection in key order.
    fn document_iterator(
        &self,
        collection: &str,
        opts: IterOptions,
    ) -> StoreResult<Box<dyn DocumentIterator + '_>>;

    /// Collects [`document_iterator`](Self::document_iterator).
    fn documents(&self, collection: &str, opts: IterOptions) -> StoreResult<Vec<Document>> {
        let mut iter = self.document_iterator(collection, opts)?;
        collect_documents(iter.as_mut())
    }

    /// Iterates collections below `parent`. Only the root is supported.
    fn collection_iterator(&self, parent: &str) -> StoreResult<Box<dyn CollectionIterator + '_>>;

    /// Collects [`collection_iterator`](Self::collection_iterator).
    fn collections(&self, parent: &str) -> StoreResult<Vec<Collection>> {
        let mut iter = self.collection_iterator(parent)?;
        collect_collections(iter.as_mut())
    }

    /// Appends records to a collection's change feed.
    ///
    /// Each value gets the next index and a fresh timestamp, allocated
    /// atomically. Returns the record paths in order.
    fn change_add(&self, collection: &str, values: Vec<Vec<u8>>) -> StoreResult<Vec<Path>>;

    /// Reads a collection's change feed from a cursor.
    ///
    /// A `limit` of zero means no cap.
    fn changes(
        &self,
        collection: &str,
        since: HybridTimestamp,
        limit: usize,
        direction: Direction,
    ) -> StoreResult<ChangeIterator<'_>> {
        let collection = collection_path(collection)?;
        let opts = IterOptions {
            reverse: direction == Direction::Descending,
            ..IterOptions::default()
        };
        let docs = self.document_iterator(collection.as_str(), opts)?;
        Ok(ChangeIterator::new(docs, since, limit, direction))
    }
}

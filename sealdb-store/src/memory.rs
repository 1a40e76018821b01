//! In-memory backend.

use crate::error::{StoreError, StoreResult};
use crate::iterator::{CollectionIterator, CollectionList, DocumentIterator, DocumentList};
use crate::options::{IterOptions, SetOptions};
use crate::paths::{change_path, collection_path, document_path, root_parent};
use crate::store::DocumentStore;
use sealdb_types::{Clock, Collection, Document, DocumentData, Path, SystemClock};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct MemState {
    docs: BTreeMap<String, Document>,
    counters: HashMap<String, u64>,
}

/// A [`DocumentStore`] held in a sorted map.
///
/// Documents, change counters and clock stamps are all taken under one lock.
/// Iterators work on a snapshot taken when they are created.
pub struct MemStore {
    state: Mutex<MemState>,
    clock: Arc<dyn Clock>,
}

impl MemStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Creates an empty store stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            clock,
        }
    }

    /// Number of stored documents, change records included.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.docs.len())
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemState>> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn new_document(&self, path: Path, data: DocumentData) -> Document {
        let now = self.clock.now();
        Document {
            path,
            data: data.data.unwrap_or_default(),
            fields: data.fields,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemStore {
    fn create(&self, path: &str, data: DocumentData) -> StoreResult<()> {
        let path = document_path(path)?;
        let mut state = self.lock()?;
        if state.docs.contains_key(path.as_str()) {
            return Err(StoreError::PathExists(path.to_string()));
        }
        let doc = self.new_document(path.clone(), data);
        state.docs.insert(path.into(), doc);
        Ok(())
    }

    fn set(&self, path: &str, data: DocumentData, opts: SetOptions) -> StoreResult<()> {
        let path = document_path(path)?;
        let mut state = self.lock()?;
        match state.docs.get_mut(path.as_str()) {
            Some(doc) => {
                if opts.merge_all {
                    data.merge_into(&mut doc.data, &mut doc.fields);
                } else {
                    doc.data = data.data.unwrap_or_default();
                    doc.fields = data.fields;
                }
                doc.updated_at = self.clock.now();
            }
            None => {
                let doc = self.new_document(path.clone(), data);
                state.docs.insert(path.into(), doc);
            }
        }
        Ok(())
    }

    fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        let path = document_path(path)?;
        Ok(self.lock()?.docs.get(path.as_str()).cloned())
    }

    fn delete(&self, path: &str) -> StoreResult<bool> {
        let path = document_path(path)?;
        Ok(self.lock()?.docs.remove(path.as_str()).is_some())
    }

    fn document_iterator(
        &self,
        collection: &str,
        opts: IterOptions,
    ) -> StoreResult<Box<dyn DocumentIterator + '_>> {
        opts.validate()?;
        let collection = collection_path(collection)?;
        let base = collection.key_prefix();
        let limit = opts.limit.unwrap_or(usize::MAX);
        let state = self.lock()?;

        let mut docs: Vec<Document> = if opts.reverse {
            // '0' is the byte after '/', so this bounds every key below `base`.
            let upper = format!("{}0", &base[..base.len() - 1]);
            state
                .docs
                .range::<str, _>((Bound::Included(base.as_str()), Bound::Excluded(upper.as_str())))
                .rev()
                .take(limit)
                .map(|(_, doc)| doc.clone())
                .collect()
        } else {
            let (start, exclusive) = opts.scan_start(&base);
            let lower = if exclusive {
                Bound::Excluded(start.as_str())
            } else {
                Bound::Included(start.as_str())
            };
            let prefix = opts.scan_prefix(&base);
            state
                .docs
                .range::<str, _>((lower, Bound::Unbounded))
                .take_while(|(key, _)| key.starts_with(&prefix))
                .take(limit)
                .map(|(_, doc)| doc.clone())
                .collect()
        };
        drop(state);

        if opts.no_data {
            for doc in &mut docs {
                doc.data = Vec::new();
            }
        }
        Ok(Box::new(DocumentList::new(docs)))
    }

    fn collection_iterator(&self, parent: &str) -> StoreResult<Box<dyn CollectionIterator + '_>> {
        root_parent(parent)?;
        let state = self.lock()?;
        let mut cols = Vec::new();
        for doc in state.docs.values() {
            if let Some(first) = doc.path.first() {
                cols.push(Collection {
                    path: Path::from_segments([first])?,
                });
            }
        }
        Ok(Box::new(CollectionList::new(cols)))
    }

    fn change_add(&self, collection: &str, values: Vec<Vec<u8>>) -> StoreResult<Vec<Path>> {
        let collection = collection_path(collection)?;
        let mut state = self.lock()?;
        let MemState { docs, counters } = &mut *state;
        let counter = counters.entry(collection.to_string()).or_insert(0);

        let mut paths = Vec::with_capacity(values.len());
        for value in values {
            *counter += 1;
            let path = change_path(&collection, *counter)?;
            let doc = self.new_document(path.clone(), DocumentData::bytes(value));
            docs.insert(path.to_string(), doc);
            paths.push(path);
        }
        debug!(collection = %collection, added = paths.len(), index = *counter, "appended changes");
        Ok(paths)
    }
}

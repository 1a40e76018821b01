//! [`DocumentStore`] on top of a [`DocumentService`].
//!
//! A document path maps to its parent collection and last segment:
//! `/test0/key1` is document `key1` of collection `/test0`. The payload is the
//! `data` field; the remaining fields are the document's fields.

use crate::config::CloudConfig;
use crate::service::{DocumentService, Query, ServiceDocument};
use sealdb_store::{
    ChangeIterator, CollectionIterator, CollectionList, Direction, DocumentIterator,
    DocumentStore, IterOptions, SetOptions, StoreError, StoreResult, change_path, collection_path,
    document_path, root_parent,
};
use sealdb_types::{Collection, Document, DocumentData, HybridTimestamp, Path, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Field holding the payload.
pub const DATA_FIELD: &str = "data";

/// Cloud-backed document store.
pub struct CloudStore<S> {
    service: Arc<S>,
    config: CloudConfig,
    write_lock: Mutex<()>,
}

impl<S: DocumentService> CloudStore<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_config(service, CloudConfig::default())
    }

    pub fn with_config(service: Arc<S>, config: CloudConfig) -> Self {
        Self {
            service,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying service.
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    fn split(path: &Path) -> StoreResult<(String, &str)> {
        match (path.parent(), path.last()) {
            (Some(parent), Some(id)) => Ok((parent.to_string(), id)),
            _ => Err(StoreError::InvalidPath(path.to_string())),
        }
    }

    fn page_size(&self) -> usize {
        self.config.page_size.max(1)
    }

    /// Removes change records of a batch that failed part way.
    fn discard(&self, paths: &[Path]) {
        for path in paths {
            let Ok((parent, id)) = Self::split(path) else {
                continue;
            };
            if let Err(err) = self.service.delete(&parent, id) {
                warn!(path = %path, error = %err, "failed to discard change record");
            }
        }
    }
}

fn to_fields(data: DocumentData, merge: bool) -> sealdb_types::Fields {
    let mut fields = data.fields;
    match data.data {
        Some(bytes) => {
            fields.insert(DATA_FIELD.to_string(), Value::Bytes(bytes));
        }
        None if !merge => {
            fields.insert(DATA_FIELD.to_string(), Value::Bytes(Vec::new()));
        }
        None => {}
    }
    fields
}

fn to_document(collection: &str, doc: ServiceDocument, no_data: bool) -> StoreResult<Document> {
    let path = Path::parse(collection)?.child(&doc.id)?;
    let mut fields = doc.fields;
    let data = match (fields.remove(DATA_FIELD), no_data) {
        (_, true) => Vec::new(),
        (Some(Value::Bytes(bytes)), false) => bytes,
        _ => return Err(StoreError::corrupted(path.as_str(), "missing data")),
    };
    Ok(Document {
        path,
        data,
        fields,
        created_at: doc.create_time,
        updated_at: doc.update_time,
    })
}

impl<S: DocumentService> DocumentStore for CloudStore<S> {
    fn create(&self, path: &str, data: DocumentData) -> StoreResult<()> {
        let path = document_path(path)?;
        let (collection, id) = Self::split(&path)?;
        self.service
            .create(&collection, id, to_fields(data, false))
            .map_err(|e| match StoreError::from(e) {
                StoreError::PathExists(_) => StoreError::PathExists(path.to_string()),
                other => other,
            })?;
        Ok(())
    }

    fn set(&self, path: &str, data: DocumentData, opts: SetOptions) -> StoreResult<()> {
        let path = document_path(path)?;
        let (collection, id) = Self::split(&path)?;
        let merge = opts.merge_all;
        let mut fields = to_fields(data, merge);
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        // A merge that creates the document still needs a payload.
        if merge
            && !fields.contains_key(DATA_FIELD)
            && self.service.get(&collection, id)?.is_none()
        {
            fields.insert(DATA_FIELD.to_string(), Value::Bytes(Vec::new()));
        }
        self.service.set(&collection, id, fields, merge)?;
        Ok(())
    }

    fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        let path = document_path(path)?;
        let (collection, id) = Self::split(&path)?;
        self.service
            .get(&collection, id)?
            .map(|doc| to_document(&collection, doc, false))
            .transpose()
    }

    fn delete(&self, path: &str) -> StoreResult<bool> {
        let path = document_path(path)?;
        let (collection, id) = Self::split(&path)?;
        Ok(self.service.delete(&collection, id)?)
    }

    fn document_iterator(
        &self,
        collection: &str,
        opts: IterOptions,
    ) -> StoreResult<Box<dyn DocumentIterator + '_>> {
        opts.validate()?;
        let collection = collection_path(collection)?;
        let mut query = Query::collection(collection.as_str());
        if opts.reverse {
            query.order = Direction::Descending;
        } else {
            match (&opts.start_after, &opts.prefix) {
                (Some(after), Some(prefix)) if prefix > after => {
                    query.start_at = Some(prefix.clone());
                }
                (Some(after), _) => query.start_after = Some(after.clone()),
                (None, Some(prefix)) => query.start_at = Some(prefix.clone()),
                (None, None) => {}
            }
        }
        Ok(Box::new(CloudIterator {
            service: self.service.as_ref(),
            collection: collection.to_string(),
            query,
            prefix: opts.prefix.unwrap_or_default(),
            no_data: opts.no_data,
            remaining: opts.limit,
            page_size: self.page_size(),
            page: VecDeque::new(),
            exhausted: false,
            done: false,
        }))
    }

    fn collection_iterator(&self, parent: &str) -> StoreResult<Box<dyn CollectionIterator + '_>> {
        root_parent(parent)?;
        let mut cols = Vec::new();
        for id in self.service.collection_ids()? {
            let path = Path::parse(&id)?;
            if path.len() == 1 {
                cols.push(Collection { path });
            }
        }
        Ok(Box::new(CollectionList::new(cols)))
    }

    fn change_add(&self, collection: &str, values: Vec<Vec<u8>>) -> StoreResult<Vec<Path>> {
        let collection = collection_path(collection)?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;

        let count = values.len() as u64;
        let first = self.service.increment(collection.as_str(), 0)? + 1;
        let last = first + count - 1;

        let paths = (first..=last)
            .map(|index| change_path(&collection, index))
            .collect::<StoreResult<Vec<_>>>()?;

        // The counter moves only after every record of the batch exists.
        for (written, (path, value)) in paths.iter().zip(values).enumerate() {
            let created = Self::split(path).and_then(|(parent, id)| {
                let fields = to_fields(DocumentData::bytes(value), false);
                Ok(self.service.create(&parent, id, fields)?)
            });
            if let Err(err) = created {
                self.discard(&paths[..written]);
                return Err(err);
            }
        }
        match self.service.increment(collection.as_str(), count) {
            Ok(value) if value == last => {}
            Ok(value) => {
                warn!(collection = %collection, last, counter = value, "change counter moved");
            }
            Err(err) => {
                self.discard(&paths);
                return Err(err.into());
            }
        }
        debug!(collection = %collection, first, last, "appended changes");
        Ok(paths)
    }

    fn changes(
        &self,
        collection: &str,
        since: HybridTimestamp,
        limit: usize,
        direction: Direction,
    ) -> StoreResult<ChangeIterator<'_>> {
        let collection = collection_path(collection)?;
        let mut query = Query::collection(collection.as_str());
        query.order = direction;
        if !since.is_zero() {
            match direction {
                Direction::Ascending => query.created_after = Some(since),
                Direction::Descending => query.created_before = Some(since),
            }
        }
        let docs = Box::new(CloudIterator {
            service: self.service.as_ref(),
            collection: collection.to_string(),
            query,
            prefix: String::new(),
            no_data: false,
            remaining: (limit > 0).then_some(limit),
            page_size: self.page_size(),
            page: VecDeque::new(),
            exhausted: false,
            done: false,
        });
        Ok(ChangeIterator::new(docs, since, limit, direction))
    }
}

/// Pages through a service query. Ids not starting with `prefix` end the
/// iteration.
struct CloudIterator<'a, S> {
    service: &'a S,
    collection: String,
    query: Query,
    prefix: String,
    no_data: bool,
    remaining: Option<usize>,
    page_size: usize,
    page: VecDeque<ServiceDocument>,
    exhausted: bool,
    done: bool,
}

impl<S: DocumentService> CloudIterator<'_, S> {
    fn fetch(&mut self) -> StoreResult<()> {
        self.query.limit = self.remaining.map_or(self.page_size, |r| r.min(self.page_size));
        let docs = self.service.query(&self.query)?;
        debug!(collection = %self.collection, count = docs.len(), "fetched page");
        if docs.len() < self.query.limit {
            self.exhausted = true;
        }
        if let Some(last) = docs.last() {
            self.query.start_at = None;
            self.query.start_after = Some(last.id.clone());
        }
        self.page.extend(docs);
        Ok(())
    }
}

impl<S: DocumentService> DocumentIterator for CloudIterator<'_, S> {
    fn next(&mut self) -> StoreResult<Option<Document>> {
        if self.done {
            return Ok(None);
        }
        if self.remaining == Some(0) {
            self.release();
            return Ok(None);
        }
        if self.page.is_empty() && !self.exhausted {
            self.fetch()?;
        }
        let Some(doc) = self.page.pop_front() else {
            self.release();
            return Ok(None);
        };
        if !doc.id.starts_with(&self.prefix) {
            self.release();
            return Ok(None);
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        to_document(&self.collection, doc, self.no_data).map(Some)
    }

    fn release(&mut self) {
        self.page.clear();
        self.exhausted = true;
        self.done = true;
    }
}

impl<S> Drop for CloudIterator<'_, S> {
    fn drop(&mut self) {
        self.page.clear();
        self.done = true;
    }
}

//! In-process document service.

use crate::error::{CloudError, CloudResult};
use crate::service::{DocumentService, Query, ServiceDocument};
use sealdb_store::Direction;
use sealdb_types::{Clock, Fields, SystemClock};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct ServiceState {
    collections: BTreeMap<String, BTreeMap<String, ServiceDocument>>,
    counters: HashMap<String, u64>,
}

/// A [`DocumentService`] kept in memory, with the same ordering and cursor
/// behavior as the hosted service.
pub struct MemoryService {
    state: Mutex<ServiceState>,
    clock: Arc<dyn Clock>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(ServiceState::default()),
            clock,
        }
    }

    fn lock(&self) -> CloudResult<MutexGuard<'_, ServiceState>> {
        self.state
            .lock()
            .map_err(|_| CloudError::Unavailable("service lock poisoned".to_string()))
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentService for MemoryService {
    fn get(&self, collection: &str, id: &str) -> CloudResult<Option<ServiceDocument>> {
        let state = self.lock()?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn create(&self, collection: &str, id: &str, fields: Fields) -> CloudResult<ServiceDocument> {
        let mut state = self.lock()?;
        let docs = state.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(CloudError::AlreadyExists(format!("{collection}/{id}")));
        }
        let now = self.clock.now();
        let doc = ServiceDocument {
            id: id.to_string(),
            fields,
            create_time: now,
            update_time: now,
        };
        docs.insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> CloudResult<ServiceDocument> {
        let mut state = self.lock()?;
        let docs = state.collections.entry(collection.to_string()).or_default();
        let now = self.clock.now();
        let doc = match docs.get_mut(id) {
            Some(doc) => {
                if merge {
                    doc.fields.extend(fields);
                } else {
                    doc.fields = fields;
                }
                doc.update_time = now;
                doc.clone()
            }
            None => {
                let doc = ServiceDocument {
                    id: id.to_string(),
                    fields,
                    create_time: now,
                    update_time: now,
                };
                docs.insert(id.to_string(), doc.clone());
                doc
            }
        };
        Ok(doc)
    }

    fn delete(&self, collection: &str, id: &str) -> CloudResult<bool> {
        let mut state = self.lock()?;
        let Some(docs) = state.collections.get_mut(collection) else {
            return Ok(false);
        };
        let removed = docs.remove(id).is_some();
        if docs.is_empty() {
            state.collections.remove(collection);
        }
        Ok(removed)
    }

    fn query(&self, query: &Query) -> CloudResult<Vec<ServiceDocument>> {
        if query.start_at.is_some() && query.start_after.is_some() {
            return Err(CloudError::InvalidArgument(
                "start_at and start_after are exclusive".to_string(),
            ));
        }
        let state = self.lock()?;
        let Some(docs) = state.collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let ascending = query.order == Direction::Ascending;
        let past_cursor = |id: &str| -> bool {
            let at = query.start_at.as_deref().is_none_or(|at| {
                if ascending { id >= at } else { id <= at }
            });
            let after = query.start_after.as_deref().is_none_or(|after| {
                if ascending { id > after } else { id < after }
            });
            at && after
        };
        let in_window = |doc: &ServiceDocument| -> bool {
            query.created_after.is_none_or(|t| doc.create_time > t)
                && query.created_before.is_none_or(|t| doc.create_time < t)
        };
        let limit = if query.limit == 0 { usize::MAX } else { query.limit };

        let ordered: Box<dyn Iterator<Item = &ServiceDocument>> = if ascending {
            Box::new(docs.values())
        } else {
            Box::new(docs.values().rev())
        };
        Ok(ordered
            .filter(|doc| past_cursor(&doc.id) && in_window(doc))
            .take(limit)
            .cloned()
            .collect())
    }

    fn collection_ids(&self) -> CloudResult<Vec<String>> {
        let state = self.lock()?;
        Ok(state.collections.keys().cloned().collect())
    }

    fn increment(&self, counter: &str, by: u64) -> CloudResult<u64> {
        let mut state = self.lock()?;
        let value = state.counters.entry(counter.to_string()).or_insert(0);
        *value += by;
        Ok(*value)
    }
}

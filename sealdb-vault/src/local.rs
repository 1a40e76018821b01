//! The vault's layout inside its local store.
//!
//! | Path                              | Contents                         |
//! |-----------------------------------|----------------------------------|
//! | `/config/salt`                    | KDF salt                         |
//! | `/auth/<id>`, `/provision/<id>`   | provisions (JSON)                |
//! | `/item/<id>`                      | sealed items                     |
//! | `/push/<index:015>`               | records waiting to be pushed     |
//! | `/pull/<seq:015>/<stream>/<id>`   | one entry per applied sequence   |
//! | `/sync/rk`, `/sync/cursor`        | remote key, pull cursor          |
//! | `/sync/marks/<stream>/<id>`       | last local write per key         |

use crate::error::{VaultError, VaultResult};
use crate::record::{Stream, SyncRecord};
use sealdb_crypto::SecretKey;
use sealdb_store::{Change, DocumentStore, IterOptions, SetOptions, change_path};
use sealdb_types::{Document, DocumentData, Path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

const PUSH: &str = "/push";
const PULL: &str = "/pull";
const REMOTE_KEY: &str = "/sync/rk";
const CURSOR: &str = "/sync/cursor";

/// Pull progress, persisted after every applied record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Last applied sequence across all streams.
    pub last: u64,
    /// Last applied sequence per stream.
    #[serde(default)]
    pub streams: BTreeMap<String, u64>,
}

impl SyncCursor {
    pub(crate) fn advanced(&self, stream: Stream, seq: u64) -> Self {
        let mut next = self.clone();
        next.last = seq;
        next.streams.insert(stream.as_str().to_string(), seq);
        next
    }

    /// Last applied sequence of one stream.
    pub fn stream(&self, stream: Stream) -> u64 {
        self.streams.get(stream.as_str()).copied().unwrap_or(0)
    }
}

/// Most recent local write to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
enum Mark {
    /// Queued at this push index, not yet on the remote.
    Pending { push: u64 },
    /// The remote holds the key at this sequence.
    Synced { seq: u64 },
}

pub(crate) struct Local {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

fn mark_path(stream: Stream, id: &str) -> String {
    format!("/sync/marks/{stream}/{id}")
}

fn pull_path(seq: u64, record: &SyncRecord) -> String {
    format!("{PULL}/{seq:015}/{}/{}", record.stream, record.id)
}

impl Local {
    pub(crate) fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn get(&self, path: &str) -> VaultResult<Option<Vec<u8>>> {
        Ok(self.store.get(path)?.map(|doc| doc.data))
    }

    pub(crate) fn documents(&self, collection: &str) -> VaultResult<Vec<Document>> {
        Ok(self.store.documents(collection, IterOptions::new())?)
    }

    /// Document paths at or below `prefix`, in key order.
    pub(crate) fn paths(&self, prefix: &str) -> VaultResult<Vec<String>> {
        let parsed = Path::parse(prefix).map_err(sealdb_store::StoreError::from)?;
        let Some(collection) = parsed.first() else {
            return Ok(Vec::new());
        };
        let relative = parsed.relative_to(&Path::root()).unwrap_or_default();
        let mut opts = IterOptions::new().no_data();
        if let Some((_, rest)) = relative.split_once('/') {
            opts = opts.prefix(rest);
        }
        let docs = self.store.documents(&format!("/{collection}"), opts)?;
        Ok(docs.into_iter().map(|doc| doc.path.to_string()).collect())
    }

    /// True until the vault is set up or a remote is attached.
    pub(crate) fn is_new(&self) -> VaultResult<bool> {
        let pending = self
            .store
            .documents(PUSH, IterOptions::new().no_data().limit(1))?;
        Ok(pending.is_empty()
            && !self.store.exists("/config/salt")?
            && !self.store.exists(REMOTE_KEY)?)
    }

    pub(crate) fn remote_key(&self) -> VaultResult<Option<SecretKey>> {
        match self.get(REMOTE_KEY)? {
            Some(bytes) => Ok(Some(SecretKey::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn set_remote_key(&self, key: &SecretKey) -> VaultResult<()> {
        self.store
            .set(REMOTE_KEY, key.as_bytes().as_slice().into(), SetOptions::replace())?;
        Ok(())
    }

    pub(crate) fn cursor(&self) -> VaultResult<SyncCursor> {
        match self.get(CURSOR)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(SyncCursor::default()),
        }
    }

    fn save_cursor(&self, cursor: &SyncCursor) -> VaultResult<()> {
        self.store
            .set(CURSOR, serde_json::to_vec(cursor)?.into(), SetOptions::replace())?;
        Ok(())
    }

    fn mark(&self, stream: Stream, id: &str) -> VaultResult<Option<Mark>> {
        match self.get(&mark_path(stream, id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_mark(&self, stream: Stream, id: &str, mark: Mark) -> VaultResult<()> {
        self.store.set(
            &mark_path(stream, id),
            serde_json::to_vec(&mark)?.into(),
            SetOptions::replace(),
        )?;
        Ok(())
    }

    fn apply(&self, record: &SyncRecord) -> VaultResult<()> {
        let path = record.path();
        if record.deleted {
            self.store.delete(&path)?;
        } else {
            self.store
                .set(&path, record.data.clone().into(), SetOptions::replace())?;
        }
        Ok(())
    }

    fn is_pulled(&self, seq: u64) -> VaultResult<bool> {
        let opts = IterOptions::new()
            .prefix(format!("{seq:015}/"))
            .no_data()
            .limit(1);
        Ok(!self.store.documents(PULL, opts)?.is_empty())
    }

    /// Applies a local write and queues it for push.
    pub(crate) fn write(&self, record: SyncRecord) -> VaultResult<()> {
        let _guard = self.write_lock.lock()?;
        self.apply(&record)?;
        let queued = self.store.change_add(PUSH, vec![record.to_bytes()?])?;
        let push = queued
            .first()
            .and_then(|p| p.last())
            .and_then(|key| key.parse::<u64>().ok())
            .ok_or_else(|| {
                VaultError::InvalidRecord("push queue returned no index".to_string())
            })?;
        self.set_mark(record.stream, &record.id, Mark::Pending { push })?;
        trace!(path = %record.path(), push, "queued record");
        Ok(())
    }

    /// Records waiting to be pushed, in queue order.
    pub(crate) fn pending(&self) -> VaultResult<Vec<(u64, SyncRecord)>> {
        self.documents(PUSH)?
            .into_iter()
            .map(|doc| {
                let change = Change::from_document(doc)?;
                Ok((change.index, SyncRecord::from_bytes(&change.data)?))
            })
            .collect()
    }

    /// Bookkeeping once the remote has accepted queue entry `push` as `seq`.
    pub(crate) fn after_push(&self, push: u64, seq: u64, record: &SyncRecord) -> VaultResult<()> {
        let _guard = self.write_lock.lock()?;
        self.store
            .set(&pull_path(seq, record), DocumentData::default(), SetOptions::replace())?;
        if self.mark(record.stream, &record.id)? == Some(Mark::Pending { push }) {
            self.set_mark(record.stream, &record.id, Mark::Synced { seq })?;
        }
        let queue = Path::parse(PUSH).map_err(sealdb_store::StoreError::from)?;
        let queued = change_path(&queue, push)?;
        self.store.delete(queued.as_str())?;
        debug!(path = %record.path(), seq, "pushed record");
        Ok(())
    }

    /// Applies a pulled record unless it is our own push or a newer local
    /// write exists, then persists `cursor`. Returns whether the record
    /// changed local state.
    pub(crate) fn apply_pulled(
        &self,
        seq: u64,
        record: &SyncRecord,
        cursor: &SyncCursor,
    ) -> VaultResult<bool> {
        let _guard = self.write_lock.lock()?;
        let mut applied = false;
        if !self.is_pulled(seq)? {
            let newer_local = match self.mark(record.stream, &record.id)? {
                Some(Mark::Pending { .. }) => true,
                Some(Mark::Synced { seq: marked }) => marked >= seq,
                None => false,
            };
            if newer_local {
                debug!(path = %record.path(), seq, "kept local write over pulled record");
            } else {
                self.apply(record)?;
                self.set_mark(record.stream, &record.id, Mark::Synced { seq })?;
                applied = true;
            }
            self.store
                .set(&pull_path(seq, record), DocumentData::default(), SetOptions::replace())?;
        }
        self.save_cursor(cursor)?;
        Ok(applied)
    }

    pub(crate) fn pending_count(&self) -> VaultResult<usize> {
        Ok(self
            .store
            .documents(PUSH, IterOptions::new().no_data())?
            .len())
    }
}

//! The encrypted SQLite engine.

use crate::codec::{RawRow, columns, db_err, seal_data, seal_fields};
use crate::config::EngineConfig;
use crate::iterator::{EngineIterator, Position};
use crate::registry::FileClaim;
use crate::schema::{init_schema, last_stamp, verify_key};
use rusqlite::{Connection, OptionalExtension, params};
use sealdb_crypto::SecretKey;
use sealdb_store::{
    CollectionIterator, CollectionList, DocumentIterator, DocumentStore, IterOptions, SetOptions,
    StoreError, StoreResult, change_path, collection_path, document_path, root_parent,
};
use sealdb_types::{
    Clock, Collection, Document, DocumentData, Fields, HybridTimestamp, Path, SystemClock,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

const COLUMNS: &str =
    "path, data, fields, created_wall, created_logical, updated_wall, updated_logical";
const COLUMNS_NO_DATA: &str =
    "path, NULL, fields, created_wall, created_logical, updated_wall, updated_logical";

struct OpenState {
    conn: Connection,
    claim: Option<FileClaim>,
}

/// Encrypted document store on SQLite.
///
/// Payloads and fields are sealed with ChaCha20-Poly1305 under the secret key,
/// bound to the document path. Paths stay in the clear and give the iteration
/// order. A database file can be held by one engine per process at a time.
pub struct Engine {
    state: Mutex<Option<OpenState>>,
    key: SecretKey,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    location: Option<PathBuf>,
}

impl Engine {
    /// Opens or creates the store at `path`.
    ///
    /// Fails with [`StoreError::InvalidKey`] if the store was created with a
    /// different key, and with [`StoreError::AlreadyOpen`] if this process
    /// already holds it.
    pub fn open(path: impl AsRef<std::path::Path>, key: SecretKey) -> StoreResult<Self> {
        Self::open_with_config(path, key, EngineConfig::default())
    }

    /// Opens or creates the store at `path` with explicit configuration.
    pub fn open_with_config(
        path: impl AsRef<std::path::Path>,
        key: SecretKey,
        config: EngineConfig,
    ) -> StoreResult<Self> {
        let location = std::path::absolute(path.as_ref())?;
        let claim = FileClaim::acquire(location.clone())?;

        let conn = Connection::open(&location).map_err(db_err)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        let engine = Self::init(conn, Some(claim), key, config, Some(location))?;
        info!(path = %engine.location_display(), "opened engine");
        Ok(engine)
    }

    /// Opens a fresh store that lives only in memory.
    pub fn open_in_memory(key: SecretKey) -> StoreResult<Self> {
        Self::open_in_memory_with_config(key, EngineConfig::default())
    }

    /// Opens a fresh in-memory store with explicit configuration.
    pub fn open_in_memory_with_config(key: SecretKey, config: EngineConfig) -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn, None, key, config, None)
    }

    fn init(
        conn: Connection,
        claim: Option<FileClaim>,
        key: SecretKey,
        config: EngineConfig,
        location: Option<PathBuf>,
    ) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(db_err)?;
        init_schema(&conn)?;
        verify_key(&conn, &key)?;
        // Stamps continue after the persisted ones even if the wall clock
        // went back while the store was closed.
        let last = last_stamp(&conn)?;
        Ok(Self {
            state: Mutex::new(Some(OpenState { conn, claim })),
            key,
            clock: Arc::new(SystemClock::after(last)),
            config,
            location,
        })
    }

    /// Replaces the clock that stamps writes.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The database file, or `None` for an in-memory store.
    pub fn location(&self) -> Option<&std::path::Path> {
        self.location.as_deref()
    }

    fn location_display(&self) -> String {
        self.location
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }

    /// Returns true until [`close`](Self::close) is called.
    pub fn is_open(&self) -> bool {
        self.state.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Closes the database and releases the file for other handles.
    ///
    /// Later operations fail with [`StoreError::Closed`]. Closing twice is a
    /// no-op.
    pub fn close(&self) -> StoreResult<()> {
        let mut state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(OpenState { conn, claim }) = state.take() {
            conn.close().map_err(|(_, e)| db_err(e))?;
            drop(claim);
            info!(path = %self.location_display(), "closed engine");
        }
        Ok(())
    }

    pub(crate) fn key(&self) -> &SecretKey {
        &self.key
    }

    pub(crate) fn page_size(&self) -> usize {
        self.config.page_size.max(1)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        let open = state.as_mut().ok_or(StoreError::Closed)?;
        f(&mut open.conn)
    }

    pub(crate) fn fetch_page(
        &self,
        position: &Position,
        no_data: bool,
        limit: usize,
    ) -> StoreResult<Vec<RawRow>> {
        let cols = if no_data { COLUMNS_NO_DATA } else { COLUMNS };
        let (sql, key) = match position {
            Position::From {
                key,
                exclusive: false,
            } => (
                format!("SELECT {cols} FROM documents WHERE path >= ?1 ORDER BY path ASC LIMIT ?2"),
                key,
            ),
            Position::From {
                key,
                exclusive: true,
            } => (
                format!("SELECT {cols} FROM documents WHERE path > ?1 ORDER BY path ASC LIMIT ?2"),
                key,
            ),
            Position::Before(key) => (
                format!("SELECT {cols} FROM documents WHERE path < ?1 ORDER BY path DESC LIMIT ?2"),
                key,
            ),
        };
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
            let rows = stmt
                .query_map(params![key, limit as i64], RawRow::from_row)
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
        })
    }

    fn write_row(
        &self,
        conn: &Connection,
        path: &str,
        data: &[u8],
        fields: &Fields,
        now: HybridTimestamp,
    ) -> StoreResult<()> {
        let sealed_data = seal_data(&self.key, path, data)?;
        let sealed_fields = seal_fields(&self.key, path, fields)?;
        let (wall, logical) = columns(now);
        conn.execute(
            "INSERT INTO documents
                (path, data, fields, created_wall, created_logical, updated_wall, updated_logical)
             VALUES (?1, ?2, ?3, ?4, ?5, ?4, ?5)
             ON CONFLICT(path) DO UPDATE SET
                data = excluded.data,
                fields = excluded.fields,
                updated_wall = excluded.updated_wall,
                updated_logical = excluded.updated_logical",
            params![path, sealed_data, sealed_fields, wall, logical],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn read_row(&self, conn: &Connection, path: &str) -> StoreResult<Option<RawRow>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM documents WHERE path = ?1"),
            [path],
            RawRow::from_row,
        )
        .optional()
        .map_err(db_err)
    }
}

fn row_exists(conn: &Connection, path: &str) -> StoreResult<bool> {
    conn.query_row("SELECT 1 FROM documents WHERE path = ?1", [path], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(db_err)
}

impl DocumentStore for Engine {
    fn create(&self, path: &str, data: DocumentData) -> StoreResult<()> {
        let path = document_path(path)?;
        self.with_conn(|conn| {
            if row_exists(conn, path.as_str())? {
                return Err(StoreError::PathExists(path.to_string()));
            }
            let now = self.clock.now();
            let payload = data.data.unwrap_or_default();
            self.write_row(conn, path.as_str(), &payload, &data.fields, now)
        })
    }

    fn set(&self, path: &str, data: DocumentData, opts: SetOptions) -> StoreResult<()> {
        let path = document_path(path)?;
        self.with_conn(|conn| {
            if opts.merge_all {
                if let Some(row) = self.read_row(conn, path.as_str())? {
                    let mut doc = row.open(&self.key)?;
                    data.merge_into(&mut doc.data, &mut doc.fields);
                    let now = self.clock.now();
                    return self.write_row(conn, path.as_str(), &doc.data, &doc.fields, now);
                }
            }
            let now = self.clock.now();
            let payload = data.data.unwrap_or_default();
            self.write_row(conn, path.as_str(), &payload, &data.fields, now)
        })
    }

    fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        let path = document_path(path)?;
        let row = self.with_conn(|conn| self.read_row(conn, path.as_str()))?;
        row.map(|row| row.open(&self.key)).transpose()
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        let path = document_path(path)?;
        self.with_conn(|conn| row_exists(conn, path.as_str()))
    }

    fn delete(&self, path: &str) -> StoreResult<bool> {
        let path = document_path(path)?;
        self.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM documents WHERE path = ?1", [path.as_str()])
                .map_err(db_err)?;
            Ok(n > 0)
        })
    }

    fn document_iterator(
        &self,
        collection: &str,
        opts: IterOptions,
    ) -> StoreResult<Box<dyn DocumentIterator + '_>> {
        opts.validate()?;
        let collection = collection_path(collection)?;
        if !self.is_open() {
            return Err(StoreError::Closed);
        }
        Ok(Box::new(EngineIterator::new(self, &collection, opts)))
    }

    fn collection_iterator(&self, parent: &str) -> StoreResult<Box<dyn CollectionIterator + '_>> {
        root_parent(parent)?;
        let names = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT DISTINCT substr(path, 2, instr(substr(path, 2), '/') - 1)
                     FROM documents ORDER BY 1",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
        })?;
        let mut cols = Vec::with_capacity(names.len());
        for name in names {
            cols.push(Collection {
                path: Path::from_segments([name])?,
            });
        }
        Ok(Box::new(CollectionList::new(cols)))
    }

    fn change_add(&self, collection: &str, values: Vec<Vec<u8>>) -> StoreResult<Vec<Path>> {
        let collection = collection_path(collection)?;
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(db_err)?;
            let mut index: i64 = tx
                .query_row(
                    "SELECT value FROM counters WHERE name = ?1",
                    [collection.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?
                .unwrap_or(0);

            let mut paths = Vec::with_capacity(values.len());
            for value in values {
                index += 1;
                let path = change_path(&collection, index as u64)?;
                let now = self.clock.now();
                self.write_row(&tx, path.as_str(), &value, &Fields::new(), now)?;
                paths.push(path);
            }

            tx.execute(
                "INSERT INTO counters (name, value) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                params![collection.as_str(), index],
            )
            .map_err(db_err)?;
            tx.commit().map_err(db_err)?;
            debug!(collection = %collection, added = paths.len(), index, "appended changes");
            Ok(paths)
        })
    }
}

//! Process-wide record of database files held open by an engine.

use sealdb_store::{StoreError, StoreResult};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex};

static OPEN_FILES: LazyLock<Mutex<HashSet<PathBuf>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Exclusive claim on a database file, released on drop.
#[derive(Debug)]
pub(crate) struct FileClaim {
    path: PathBuf,
}

impl FileClaim {
    /// Claims `path`, failing if another handle in this process holds it.
    pub(crate) fn acquire(path: PathBuf) -> StoreResult<Self> {
        let mut open = OPEN_FILES.lock().map_err(|_| StoreError::LockPoisoned)?;
        if !open.insert(path.clone()) {
            return Err(StoreError::AlreadyOpen(path.display().to_string()));
        }
        Ok(Self { path })
    }
}

impl Drop for FileClaim {
    fn drop(&mut self) {
        let mut open = match OPEN_FILES.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        open.remove(&self.path);
    }
}

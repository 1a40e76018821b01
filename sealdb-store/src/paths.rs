//! Path checks shared by the backends.

use crate::error::{StoreError, StoreResult};
use sealdb_types::Path;

/// Parses a path that must name a document.
///
/// The root path and collection paths are rejected with `invalid path <p>`.
pub fn document_path(s: &str) -> StoreResult<Path> {
    let path = Path::parse(s).map_err(|_| StoreError::InvalidPath(s.to_string()))?;
    if !path.is_document() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(path)
}

/// Parses a path that must name a collection.
pub fn collection_path(s: &str) -> StoreResult<Path> {
    let path = Path::parse(s).map_err(|_| StoreError::InvalidPath(s.to_string()))?;
    if !path.is_collection() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(path)
}

/// Checks that a collection listing is requested at the root.
pub fn root_parent(s: &str) -> StoreResult<()> {
    let path = Path::parse(s).map_err(|_| StoreError::InvalidPath(s.to_string()))?;
    if !path.is_root() {
        return Err(StoreError::OnlyRootCollections);
    }
    Ok(())
}

/// Path of the change record with the given index.
pub fn change_path(collection: &Path, index: u64) -> StoreResult<Path> {
    Ok(collection.child(&format!("{index:015}"))?)
}

//! Sealing of document rows.

use sealdb_crypto::{SecretKey, open, seal};
use sealdb_store::{StoreError, StoreResult};
use sealdb_types::{Document, Fields, HybridTimestamp, Path};

pub(crate) fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn fields_aad(path: &str) -> Vec<u8> {
    format!("{path}#fields").into_bytes()
}

/// A document row as read from SQLite, still sealed.
pub(crate) struct RawRow {
    pub path: String,
    /// `None` when the payload was not selected.
    pub data: Option<Vec<u8>>,
    pub fields: Vec<u8>,
    pub created: HybridTimestamp,
    pub updated: HybridTimestamp,
}

impl RawRow {
    /// Reads columns `path, data, fields, created_wall, created_logical,
    /// updated_wall, updated_logical`.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            data: row.get(1)?,
            fields: row.get(2)?,
            created: timestamp(row.get(3)?, row.get(4)?),
            updated: timestamp(row.get(5)?, row.get(6)?),
        })
    }

    /// Opens the sealed columns.
    pub(crate) fn open(self, key: &SecretKey) -> StoreResult<Document> {
        let path = Path::parse(&self.path)
            .map_err(|e| StoreError::corrupted(self.path.as_str(), e))?;
        let data = match &self.data {
            Some(sealed) => open(key, sealed, self.path.as_bytes())
                .map_err(|e| StoreError::corrupted(self.path.as_str(), e))?,
            None => Vec::new(),
        };
        let fields_json = open(key, &self.fields, &fields_aad(&self.path))
            .map_err(|e| StoreError::corrupted(self.path.as_str(), e))?;
        let fields: Fields = serde_json::from_slice(&fields_json)
            .map_err(|e| StoreError::corrupted(self.path.as_str(), e))?;
        Ok(Document {
            path,
            data,
            fields,
            created_at: self.created,
            updated_at: self.updated,
        })
    }
}

/// Seals a payload for `path`.
pub(crate) fn seal_data(key: &SecretKey, path: &str, data: &[u8]) -> StoreResult<Vec<u8>> {
    seal(key, data, path.as_bytes()).map_err(|e| StoreError::Backend(e.to_string()))
}

/// Seals the fields of `path`.
pub(crate) fn seal_fields(key: &SecretKey, path: &str, fields: &Fields) -> StoreResult<Vec<u8>> {
    let json = serde_json::to_vec(fields)?;
    seal(key, &json, &fields_aad(path)).map_err(|e| StoreError::Backend(e.to_string()))
}

pub(crate) fn timestamp(wall: i64, logical: i64) -> HybridTimestamp {
    HybridTimestamp::new(wall as u64, logical as u32)
}

/// Splits a timestamp into its stored columns.
pub(crate) fn columns(ts: HybridTimestamp) -> (i64, i64) {
    (ts.wall_time() as i64, i64::from(ts.logical()))
}

//! Records exchanged with the remote.

use crate::error::{VaultError, VaultResult};
use sealdb_crypto::{SecretKey, open, seal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const RECORD_AAD: &[u8] = b"sealdb-sync-record";

/// Rejects ids that would not map to a single path segment.
pub(crate) fn check_id(id: &str) -> VaultResult<()> {
    if id.is_empty() || id.contains('/') {
        return Err(VaultError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Kind of synced record. All kinds share one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// Vault configuration (the KDF salt).
    Config,
    /// Wrapped master keys.
    Auth,
    /// Provision metadata.
    Provision,
    /// User items.
    Item,
}

impl Stream {
    pub const ALL: [Stream; 4] = [Stream::Config, Stream::Auth, Stream::Provision, Stream::Item];

    /// Path segment and display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Config => "config",
            Stream::Auth => "auth",
            Stream::Provision => "provision",
            Stream::Item => "item",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stream {
    type Err = VaultError;

    fn from_str(s: &str) -> VaultResult<Self> {
        Stream::ALL
            .into_iter()
            .find(|stream| stream.as_str() == s)
            .ok_or_else(|| VaultError::InvalidRecord(format!("unknown stream {s:?}")))
    }
}

/// One local mutation: a write or a delete of `/<stream>/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub stream: Stream,
    pub id: String,
    pub data: Vec<u8>,
    #[serde(default)]
    pub deleted: bool,
}

impl SyncRecord {
    pub fn write(stream: Stream, id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            stream,
            id: id.into(),
            data,
            deleted: false,
        }
    }

    pub fn delete(stream: Stream, id: impl Into<String>) -> Self {
        Self {
            stream,
            id: id.into(),
            data: Vec::new(),
            deleted: true,
        }
    }

    /// Local path the record applies to.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.stream, self.id)
    }

    pub(crate) fn to_bytes(&self) -> VaultResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        let record: Self = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::InvalidRecord(e.to_string()))?;
        check_id(&record.id).map_err(|e| VaultError::InvalidRecord(e.to_string()))?;
        Ok(record)
    }

    /// Seals the record for the remote.
    pub fn seal(&self, key: &SecretKey) -> VaultResult<Vec<u8>> {
        Ok(seal(key, &self.to_bytes()?, RECORD_AAD)?)
    }

    /// Opens a record received from the remote.
    pub fn open(key: &SecretKey, sealed: &[u8]) -> VaultResult<Self> {
        let bytes = open(key, sealed, RECORD_AAD)
            .map_err(|e| VaultError::InvalidRecord(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

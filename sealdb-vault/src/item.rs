//! Vault items.

use crate::error::VaultResult;
use chrono::{DateTime, Utc};
use sealdb_crypto::{SecretKey, open, seal};
use serde::{Deserialize, Serialize};

/// A secret stored in the vault.
///
/// Items are sealed with the master key, bound to their path, before they
/// touch the store or the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub data: Vec<u8>,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub item_type: String,
    pub timestamp: DateTime<Utc>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        data: impl Into<Vec<u8>>,
        item_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
            item_type: item_type.into(),
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn seal(&self, key: &SecretKey, path: &str) -> VaultResult<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        Ok(seal(key, &json, path.as_bytes())?)
    }

    pub(crate) fn open(key: &SecretKey, path: &str, sealed: &[u8]) -> VaultResult<Self> {
        let json = open(key, sealed, path.as_bytes())?;
        Ok(serde_json::from_slice(&json)?)
    }
}

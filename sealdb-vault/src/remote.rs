//! The remote side of vault sync.

use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use sealdb_store::{Change, DocumentStore, IterOptions};
use std::sync::Arc;
use tracing::debug;

/// A sealed record and the sequence the remote assigned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    pub seq: u64,
    pub data: Vec<u8>,
}

/// Append-only, sequence-numbered log per vault.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Appends a record and returns its sequence (from 1, gap-free).
    async fn append(&self, vault_id: &str, record: Vec<u8>) -> VaultResult<u64>;

    /// Returns up to `limit` records with a sequence above `cursor`, ascending.
    async fn pull_since(
        &self,
        vault_id: &str,
        cursor: u64,
        limit: usize,
    ) -> VaultResult<Vec<RemoteRecord>>;
}

/// [`Remote`] kept in any [`DocumentStore`].
///
/// Each vault is the change feed of collection `/vaults/<vault_id>/records`:
/// the change index is the sequence, and pulls are key scans after the
/// cursor's zero-padded index.
pub struct StoreRemote {
    store: Arc<dyn DocumentStore>,
}

impl StoreRemote {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(vault_id: &str) -> String {
        format!("/vaults/{vault_id}/records")
    }
}

fn task_err(e: tokio::task::JoinError) -> VaultError {
    VaultError::Task(e.to_string())
}

#[async_trait]
impl Remote for StoreRemote {
    async fn append(&self, vault_id: &str, record: Vec<u8>) -> VaultResult<u64> {
        let store = Arc::clone(&self.store);
        let collection = Self::collection(vault_id);
        let paths = tokio::task::spawn_blocking(move || store.change_add(&collection, vec![record]))
            .await
            .map_err(task_err)?
            .map_err(|e| VaultError::Remote(e.to_string()))?;

        let seq = paths
            .first()
            .and_then(|p| p.last())
            .and_then(|key| key.parse::<u64>().ok())
            .ok_or_else(|| VaultError::Remote("append returned no sequence".to_string()))?;
        debug!(vault = vault_id, seq, "appended record");
        Ok(seq)
    }

    async fn pull_since(
        &self,
        vault_id: &str,
        cursor: u64,
        limit: usize,
    ) -> VaultResult<Vec<RemoteRecord>> {
        let store = Arc::clone(&self.store);
        let collection = Self::collection(vault_id);
        let opts = IterOptions::new()
            .start_after(format!("{cursor:015}"))
            .limit(limit.max(1));
        let docs = tokio::task::spawn_blocking(move || store.documents(&collection, opts))
            .await
            .map_err(task_err)?
            .map_err(|e| VaultError::Remote(e.to_string()))?;

        docs.into_iter()
            .map(|doc| {
                let change =
                    Change::from_document(doc).map_err(|e| VaultError::Remote(e.to_string()))?;
                Ok(RemoteRecord {
                    seq: change.index,
                    data: change.data,
                })
            })
            .collect()
    }
}

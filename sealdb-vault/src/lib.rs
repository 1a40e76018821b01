//! Encrypted vault with remote sync for SealDB.
//!
//! A [`Vault`] keeps sealed items and its unlock provisions in any
//! [`DocumentStore`](sealdb_store::DocumentStore). Every local write is
//! queued under `/push`; [`Vault::sync`] pushes the queue to a [`Remote`]
//! and pulls the remote's records in sequence order. Each applied sequence
//! leaves an entry at `/pull/<seq:015>/<stream>/<id>`, so two synced vaults
//! list the same `/pull` paths.
//!
//! The remote only ever sees records sealed with a key derived from the
//! vault's remote key.

mod auth;
mod cancel;
mod config;
mod error;
mod item;
mod local;
mod record;
mod remote;
mod vault;

pub use auth::{AuthType, Provision};
pub use cancel::{CancelHandle, Cancellation, cancellation};
pub use config::{KdfConfig, VaultConfig};
pub use error::{Phase, VaultError, VaultResult};
pub use item::Item;
pub use local::SyncCursor;
pub use record::{Stream, SyncRecord};
pub use remote::{Remote, RemoteRecord, StoreRemote};
pub use vault::{MIN_PASSWORD_LEN, SyncReport, Vault, VaultStatus, vault_id};

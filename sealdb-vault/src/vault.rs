//! The vault: encrypted items, provisions and remote sync over a local store.

use crate::auth::{AuthEntry, AuthType, Provision};
use crate::cancel::Cancellation;
use crate::config::{KdfConfig, VaultConfig};
use crate::error::{Phase, VaultError, VaultResult};
use crate::item::Item;
use crate::local::{Local, SyncCursor};
use crate::record::{Stream, SyncRecord, check_id};
use crate::remote::Remote;
use sealdb_crypto::{
    KdfParams, Salt, SecretKey, unwrap_key, unwrap_key_with_password, wrap_key,
    wrap_key_with_password,
};
use sealdb_store::{DocumentStore, document_path};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Minimum password length for password provisions.
pub const MIN_PASSWORD_LEN: usize = 8;

const SALT_ID: &str = "salt";

/// Identifier of a vault on its remote: hex SHA-256 of the remote key.
pub fn vault_id(remote_key: &SecretKey) -> String {
    hex::encode(remote_key.fingerprint())
}

fn record_key(remote_key: &SecretKey) -> SecretKey {
    remote_key.derive("sync-records")
}

/// Snapshot of a vault's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStatus {
    /// A salt and at least one provision exist.
    pub setup: bool,
    pub unlocked: bool,
    /// A remote is attached.
    pub remote: bool,
    /// Local writes not yet pushed.
    pub pending: usize,
    pub cursor: SyncCursor,
}

/// Counts from one [`Vault::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub pulled: usize,
}

/// An encrypted vault kept in a [`DocumentStore`].
///
/// Every local write is queued and pushed to the [`Remote`] in order; pulls
/// apply the remote's records in sequence order, each exactly once.
pub struct Vault {
    local: Arc<Local>,
    config: VaultConfig,
    master_key: Mutex<Option<SecretKey>>,
    remote: Mutex<Option<Arc<dyn Remote>>>,
    sync_lock: tokio::sync::Mutex<()>,
}

impl Vault {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, VaultConfig::default())
    }

    pub fn with_config(store: Arc<dyn DocumentStore>, config: VaultConfig) -> Self {
        Self {
            local: Arc::new(Local::new(store)),
            config,
            master_key: Mutex::new(None),
            remote: Mutex::new(None),
            sync_lock: tokio::sync::Mutex::new(()),
        }
    }

    // ── Setup and unlock ─────────────────────────────────────────

    /// Creates a new vault protected by `password` and unlocks it.
    ///
    /// Queues the salt, the password provision and a fresh remote key's
    /// first records for push.
    pub fn setup(&self, password: &str) -> VaultResult<Provision> {
        check_password(password)?;
        if !self.local.is_new()? {
            return Err(VaultError::AlreadySetup);
        }

        let salt = Salt::random();
        let master_key = SecretKey::random();
        self.local.write(SyncRecord::write(
            Stream::Config,
            SALT_ID,
            salt.as_bytes().to_vec(),
        ))?;
        let provision = self.add_password(password, &salt, &master_key)?;
        self.local.set_remote_key(&SecretKey::random())?;

        *self.master_key.lock()? = Some(master_key);
        info!(provision = %provision.id, "vault set up");
        Ok(provision)
    }

    /// Unlocks with a password provision.
    pub fn unlock_with_password(&self, password: &str) -> VaultResult<()> {
        let salt = self.salt()?;
        let entries = self.auth_entries()?;
        if entries.is_empty() {
            return Err(VaultError::NotSetup);
        }

        for entry in entries.iter().filter(|e| e.auth_type == AuthType::Password) {
            let kdf = entry.kdf.clone().unwrap_or_default();
            let params = KdfParams::from(&kdf);
            let unwrapped =
                unwrap_key_with_password(password, &salt, &params, &entry.wrapped_key);
            if let Ok(key) = unwrapped {
                *self.master_key.lock()? = Some(key);
                debug!(provision = %entry.id, "unlocked with password");
                return Ok(());
            }
        }
        warn!("unlock with password failed");
        Err(VaultError::InvalidPassword)
    }

    /// Unlocks with a key provision.
    pub fn unlock_with_key(&self, key: &SecretKey) -> VaultResult<()> {
        let entries = self.auth_entries()?;
        if entries.is_empty() {
            return Err(VaultError::NotSetup);
        }

        for entry in entries.iter().filter(|e| e.auth_type == AuthType::Key) {
            if let Ok(master) = unwrap_key(key, &entry.wrapped_key) {
                *self.master_key.lock()? = Some(master);
                debug!(provision = %entry.id, "unlocked with key");
                return Ok(());
            }
        }
        warn!("unlock with key failed");
        Err(VaultError::InvalidKey)
    }

    /// Clears the master key from memory.
    pub fn lock(&self) {
        if let Ok(mut key) = self.master_key.lock() {
            *key = None;
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.master_key.lock().is_ok_and(|key| key.is_some())
    }

    fn master_key(&self) -> VaultResult<SecretKey> {
        self.master_key.lock()?.clone().ok_or(VaultError::Locked)
    }

    fn salt(&self) -> VaultResult<Salt> {
        let bytes = self
            .local
            .get(&format!("/{}/{SALT_ID}", Stream::Config))?
            .ok_or(VaultError::NotSetup)?;
        Ok(Salt::from_slice(&bytes)?)
    }

    fn auth_entries(&self) -> VaultResult<Vec<AuthEntry>> {
        self.local
            .documents(&format!("/{}", Stream::Auth))?
            .into_iter()
            .map(|doc| Ok(serde_json::from_slice(&doc.data)?))
            .collect()
    }

    // ── Provisions ───────────────────────────────────────────────

    /// Adds a password that unlocks the vault.
    pub fn provision_password(&self, password: &str) -> VaultResult<Provision> {
        check_password(password)?;
        let master_key = self.master_key()?;
        let salt = self.salt()?;
        self.add_password(password, &salt, &master_key)
    }

    /// Adds a raw key that unlocks the vault.
    pub fn provision_key(&self, key: &SecretKey) -> VaultResult<Provision> {
        let master_key = self.master_key()?;
        let provision = Provision::new(AuthType::Key);
        let entry = AuthEntry {
            id: provision.id.clone(),
            auth_type: AuthType::Key,
            wrapped_key: wrap_key(key, &master_key)?,
            kdf: None,
        };
        self.add_provision(&entry, &provision)?;
        Ok(provision)
    }

    fn add_password(
        &self,
        password: &str,
        salt: &Salt,
        master_key: &SecretKey,
    ) -> VaultResult<Provision> {
        let kdf: KdfConfig = self.config.kdf.clone();
        let wrapped_key =
            wrap_key_with_password(password, salt, &KdfParams::from(&kdf), master_key)?;
        let provision = Provision::new(AuthType::Password);
        let entry = AuthEntry {
            id: provision.id.clone(),
            auth_type: AuthType::Password,
            wrapped_key,
            kdf: Some(kdf),
        };
        self.add_provision(&entry, &provision)?;
        Ok(provision)
    }

    fn add_provision(&self, entry: &AuthEntry, provision: &Provision) -> VaultResult<()> {
        self.local.write(SyncRecord::write(
            Stream::Auth,
            entry.id.as_str(),
            serde_json::to_vec(entry)?,
        ))?;
        self.local.write(SyncRecord::write(
            Stream::Provision,
            provision.id.as_str(),
            serde_json::to_vec(provision)?,
        ))?;
        debug!(provision = %provision.id, auth_type = ?provision.auth_type, "provisioned");
        Ok(())
    }

    /// Removes a provision. The last one cannot be removed.
    pub fn deprovision(&self, id: &str) -> VaultResult<()> {
        check_id(id)?;
        self.master_key()?;
        let entries = self.auth_entries()?;
        if !entries.iter().any(|e| e.id == id) {
            return Err(VaultError::ProvisionNotFound(id.to_string()));
        }
        if entries.len() == 1 {
            return Err(VaultError::LastProvision);
        }
        self.local.write(SyncRecord::delete(Stream::Auth, id))?;
        self.local.write(SyncRecord::delete(Stream::Provision, id))?;
        info!(provision = id, "deprovisioned");
        Ok(())
    }

    /// Provisions, oldest first.
    pub fn provisions(&self) -> VaultResult<Vec<Provision>> {
        let mut provisions = self
            .local
            .documents(&format!("/{}", Stream::Provision))?
            .into_iter()
            .map(|doc| Ok(serde_json::from_slice(&doc.data)?))
            .collect::<VaultResult<Vec<Provision>>>()?;
        provisions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(provisions)
    }

    // ── Items ────────────────────────────────────────────────────

    /// Stores an item, replacing any with the same id.
    pub fn set(&self, item: &Item) -> VaultResult<()> {
        let master_key = self.master_key()?;
        let path = item_path(&item.id)?;
        let sealed = item.seal(&master_key, &path)?;
        self.local
            .write(SyncRecord::write(Stream::Item, item.id.as_str(), sealed))
    }

    pub fn get(&self, id: &str) -> VaultResult<Option<Item>> {
        let master_key = self.master_key()?;
        let path = item_path(id)?;
        match self.local.get(&path)? {
            Some(sealed) => Ok(Some(Item::open(&master_key, &path, &sealed)?)),
            None => Ok(None),
        }
    }

    /// Deletes an item. Returns false if it was absent.
    pub fn delete(&self, id: &str) -> VaultResult<bool> {
        self.master_key()?;
        let path = item_path(id)?;
        if self.local.get(&path)?.is_none() {
            return Ok(false);
        }
        self.local.write(SyncRecord::delete(Stream::Item, id))?;
        Ok(true)
    }

    /// Every item, in id order.
    pub fn items(&self) -> VaultResult<Vec<Item>> {
        let master_key = self.master_key()?;
        self.local
            .documents(&format!("/{}", Stream::Item))?
            .into_iter()
            .map(|doc| Item::open(&master_key, doc.path.as_str(), &doc.data))
            .collect()
    }

    // ── Remote ───────────────────────────────────────────────────

    /// The key other devices need to join this vault's remote.
    pub fn remote_key(&self) -> VaultResult<Option<SecretKey>> {
        self.local.remote_key()
    }

    pub fn set_remote(&self, remote: Arc<dyn Remote>) -> VaultResult<()> {
        *self.remote.lock()? = Some(remote);
        Ok(())
    }

    fn remote(&self) -> VaultResult<Arc<dyn Remote>> {
        self.remote.lock()?.clone().ok_or(VaultError::NoRemote)
    }

    /// Document paths at or below `prefix` in the local store.
    pub fn paths(&self, prefix: &str) -> VaultResult<Vec<String>> {
        self.local.paths(prefix)
    }

    pub fn status(&self) -> VaultResult<VaultStatus> {
        Ok(VaultStatus {
            setup: !self.auth_entries()?.is_empty(),
            unlocked: self.is_unlocked(),
            remote: self.remote.lock()?.is_some(),
            pending: self.local.pending_count()?,
            cursor: self.local.cursor()?,
        })
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Joins an existing remote vault: stores its key and pulls everything.
    ///
    /// Only valid on a brand-new vault. Unlock afterwards with a provision
    /// that was pulled.
    pub async fn init_remote(
        &self,
        remote_key: SecretKey,
        cancel: &Cancellation,
    ) -> VaultResult<usize> {
        let _sync = self.sync_lock.lock().await;
        let remote = self.remote()?;
        if !self.local.is_new()? {
            return Err(VaultError::AlreadySetup);
        }
        self.local.set_remote_key(&remote_key)?;
        info!(vault = %vault_id(&remote_key), "joining remote vault");
        self.pull(remote.as_ref(), &remote_key, cancel).await
    }

    /// Pushes pending local writes, then pulls new remote records.
    pub async fn sync(&self, cancel: &Cancellation) -> VaultResult<SyncReport> {
        let _sync = self.sync_lock.lock().await;
        let remote = self.remote()?;
        let remote_key = self.local.remote_key()?.ok_or(VaultError::NoRemoteKey)?;

        let pushed = self.push(remote.as_ref(), &remote_key, cancel).await?;
        let pulled = self.pull(remote.as_ref(), &remote_key, cancel).await?;
        info!(pushed, pulled, "sync complete");
        Ok(SyncReport { pushed, pulled })
    }

    async fn push(
        &self,
        remote: &dyn Remote,
        remote_key: &SecretKey,
        cancel: &Cancellation,
    ) -> VaultResult<usize> {
        let vault_id = vault_id(remote_key);
        let record_key = record_key(remote_key);
        let pending = self
            .blocking(|local| local.pending())
            .await
            .map_err(VaultError::during(Phase::Push, None))?;

        let mut pushed = 0;
        for (push, record) in pending {
            let stream = Some(record.stream);
            let sealed = record
                .seal(&record_key)
                .map_err(VaultError::during(Phase::Push, stream))?;
            let seq = cancel
                .run(remote.append(&vault_id, sealed))
                .await
                .and_then(|appended| appended)
                .map_err(VaultError::during(Phase::Push, stream))?;
            self.blocking(move |local| local.after_push(push, seq, &record))
                .await
                .map_err(VaultError::during(Phase::Push, stream))?;
            pushed += 1;
        }
        Ok(pushed)
    }

    async fn pull(
        &self,
        remote: &dyn Remote,
        remote_key: &SecretKey,
        cancel: &Cancellation,
    ) -> VaultResult<usize> {
        let vault_id = vault_id(remote_key);
        let record_key = record_key(remote_key);
        let limit = self.config.pull_limit.max(1);
        let mut cursor = self
            .blocking(|local| local.cursor())
            .await
            .map_err(VaultError::during(Phase::Pull, None))?;

        let mut pulled = 0;
        loop {
            let page = cancel
                .run(remote.pull_since(&vault_id, cursor.last, limit))
                .await
                .and_then(|page| page)
                .map_err(VaultError::during(Phase::Pull, None))?;
            let full = page.len() >= limit;

            for remote_record in page {
                cancel.check()?;
                if remote_record.seq <= cursor.last {
                    continue;
                }
                let expected = cursor.last + 1;
                if remote_record.seq != expected {
                    warn!(expected, got = remote_record.seq, "remote sequence gap");
                    return Err(VaultError::OutOfOrder {
                        expected,
                        got: remote_record.seq,
                    });
                }

                let seq = remote_record.seq;
                let record = SyncRecord::open(&record_key, &remote_record.data)
                    .map_err(VaultError::during(Phase::Pull, None))?;
                let stream = record.stream;
                let next = cursor.advanced(stream, seq);
                let saved = next.clone();
                let applied = self
                    .blocking(move |local| local.apply_pulled(seq, &record, &saved))
                    .await
                    .map_err(VaultError::during(Phase::Pull, Some(stream)))?;
                cursor = next;
                if applied {
                    pulled += 1;
                }
            }

            if !full {
                break;
            }
        }
        debug!(cursor = cursor.last, pulled, "pull complete");
        Ok(pulled)
    }

    /// Runs store work off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> VaultResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Local) -> VaultResult<T> + Send + 'static,
    {
        let local = Arc::clone(&self.local);
        tokio::task::spawn_blocking(move || f(&local))
            .await
            .map_err(|e| VaultError::Task(e.to_string()))?
    }
}

fn check_password(password: &str) -> VaultResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VaultError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

fn item_path(id: &str) -> VaultResult<String> {
    check_id(id)?;
    Ok(document_path(&format!("/{}/{id}", Stream::Item))?.to_string())
}

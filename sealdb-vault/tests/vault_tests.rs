use pretty_assertions::assert_eq;
use sealdb_crypto::SecretKey;
use sealdb_engine::Engine;
use sealdb_store::{DocumentStore, MemStore};
use sealdb_vault::{AuthType, Item, KdfConfig, Vault, VaultConfig, VaultError};
use std::sync::Arc;

fn config() -> VaultConfig {
    VaultConfig {
        kdf: KdfConfig::insecure_fast(),
        ..VaultConfig::default()
    }
}

fn mem_vault() -> Vault {
    Vault::with_config(Arc::new(MemStore::new()), config())
}

// ── Setup and unlock ────────────────────────────────────────────

#[test]
fn setup_unlock_lock() {
    let vault = mem_vault();
    assert!(!vault.is_unlocked());
    assert!(!vault.status().unwrap().setup);

    vault.setup("mypassword").unwrap();
    assert!(vault.is_unlocked());
    assert!(vault.status().unwrap().setup);

    vault.lock();
    assert!(!vault.is_unlocked());

    vault.unlock_with_password("mypassword").unwrap();
    assert!(vault.is_unlocked());
}

#[test]
fn wrong_password_leaves_vault_locked() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    vault.lock();

    let err = vault.unlock_with_password("notmypassword").unwrap_err();
    assert!(matches!(err, VaultError::InvalidPassword));
    assert_eq!(err.to_string(), "invalid password");
    assert!(!vault.is_unlocked());
}

#[test]
fn password_too_short() {
    let vault = mem_vault();
    let err = vault.setup("short").unwrap_err();
    assert!(matches!(err, VaultError::PasswordTooShort { min: 8 }));
    assert!(!vault.status().unwrap().setup);
}

#[test]
fn double_setup_fails() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    assert!(matches!(
        vault.setup("mypassword").unwrap_err(),
        VaultError::AlreadySetup
    ));
}

#[test]
fn unlock_before_setup_fails() {
    let vault = mem_vault();
    assert!(matches!(
        vault.unlock_with_password("mypassword").unwrap_err(),
        VaultError::NotSetup
    ));
    assert!(matches!(
        vault.unlock_with_key(&SecretKey::random()).unwrap_err(),
        VaultError::NotSetup
    ));
}

#[test]
fn setup_creates_remote_key() {
    let vault = mem_vault();
    assert!(vault.remote_key().unwrap().is_none());
    vault.setup("mypassword").unwrap();
    assert!(vault.remote_key().unwrap().is_some());
}

// ── Provisions ──────────────────────────────────────────────────

#[test]
fn key_provision_unlocks() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    vault.set(&Item::new("key1", "value1", "")).unwrap();

    let key = SecretKey::random();
    let provision = vault.provision_key(&key).unwrap();
    assert_eq!(provision.auth_type, AuthType::Key);
    vault.lock();

    assert!(matches!(
        vault.unlock_with_key(&SecretKey::random()).unwrap_err(),
        VaultError::InvalidKey
    ));
    vault.unlock_with_key(&key).unwrap();
    assert_eq!(vault.get("key1").unwrap().unwrap().data, b"value1");
}

#[test]
fn second_password_provision() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    vault.provision_password("otherpassword").unwrap();
    vault.lock();

    vault.unlock_with_password("otherpassword").unwrap();
    vault.lock();
    vault.unlock_with_password("mypassword").unwrap();
}

#[test]
fn provisions_are_listed() {
    let vault = mem_vault();
    let first = vault.setup("mypassword").unwrap();
    let second = vault.provision_key(&SecretKey::random()).unwrap();

    let ids: Vec<String> = vault.provisions().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}

#[test]
fn deprovision() {
    let vault = mem_vault();
    let password = vault.setup("mypassword").unwrap();
    let key = SecretKey::random();
    vault.provision_key(&key).unwrap();

    vault.deprovision(&password.id).unwrap();
    assert_eq!(vault.provisions().unwrap().len(), 1);

    vault.lock();
    assert!(matches!(
        vault.unlock_with_password("mypassword").unwrap_err(),
        VaultError::InvalidPassword
    ));
    vault.unlock_with_key(&key).unwrap();
}

#[test]
fn last_provision_cannot_be_removed() {
    let vault = mem_vault();
    let provision = vault.setup("mypassword").unwrap();
    assert!(matches!(
        vault.deprovision(&provision.id).unwrap_err(),
        VaultError::LastProvision
    ));
    assert!(matches!(
        vault.deprovision("missing").unwrap_err(),
        VaultError::ProvisionNotFound(id) if id == "missing"
    ));
    assert!(matches!(
        vault.deprovision("a/b/c").unwrap_err(),
        VaultError::InvalidId(_)
    ));
}

#[test]
fn provisioning_requires_unlock() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    vault.lock();
    assert!(matches!(
        vault.provision_key(&SecretKey::random()).unwrap_err(),
        VaultError::Locked
    ));
}

// ── Items ───────────────────────────────────────────────────────

#[test]
fn item_set_get_delete() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();

    let item = Item::new("key1", "value1", "note");
    vault.set(&item).unwrap();
    assert_eq!(vault.get("key1").unwrap(), Some(item));
    assert_eq!(vault.get("missing").unwrap(), None);

    assert!(vault.delete("key1").unwrap());
    assert!(!vault.delete("key1").unwrap());
    assert_eq!(vault.get("key1").unwrap(), None);
}

#[test]
fn items_in_id_order() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    for id in ["b", "a", "c"] {
        vault.set(&Item::new(id, id, "")).unwrap();
    }
    let ids: Vec<String> = vault.items().unwrap().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn locked_vault_rejects_items() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    vault.set(&Item::new("key1", "value1", "")).unwrap();
    vault.lock();

    let err = vault.get("key1").unwrap_err();
    assert!(matches!(err, VaultError::Locked));
    assert_eq!(err.to_string(), "vault is locked");
    assert!(vault.set(&Item::new("key2", "value2", "")).is_err());
    assert!(vault.items().is_err());
}

#[test]
fn invalid_item_id_is_rejected() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    for id in ["a/b", "a/b/c", ""] {
        let err = vault.set(&Item::new(id, "x", "")).unwrap_err();
        assert!(matches!(err, VaultError::InvalidId(_)), "{id:?}: {err}");
        assert!(matches!(vault.get(id).unwrap_err(), VaultError::InvalidId(_)));
    }
    assert!(vault.paths("/item").unwrap().is_empty());
    assert_eq!(vault.status().unwrap().pending, 3);
}

#[test]
fn items_are_sealed_in_the_store() {
    let store = Arc::new(MemStore::new());
    let vault = Vault::with_config(store.clone(), config());
    vault.setup("mypassword").unwrap();
    vault.set(&Item::new("key1", "plaintext-secret", "")).unwrap();

    let doc = store.get("/item/key1").unwrap().unwrap();
    let needle = b"plaintext-secret";
    assert!(!doc.data.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn writes_are_queued_for_push() {
    let vault = mem_vault();
    vault.setup("mypassword").unwrap();
    // salt, auth, provision
    assert_eq!(vault.status().unwrap().pending, 3);

    vault.set(&Item::new("key1", "value1", "")).unwrap();
    assert_eq!(vault.status().unwrap().pending, 4);
    assert!(vault.paths("/push").unwrap()[0].ends_with("000000000000001"));
}

// ── Engine-backed ───────────────────────────────────────────────

#[test]
fn vault_survives_engine_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let key = SecretKey::from_bytes([7; 32]);

    let engine = Arc::new(Engine::open(&path, key.clone()).unwrap());
    let vault = Vault::with_config(engine.clone(), config());
    vault.setup("mypassword").unwrap();
    vault.set(&Item::new("key1", "value1", "")).unwrap();
    drop(vault);
    engine.close().unwrap();

    let engine = Arc::new(Engine::open(&path, key).unwrap());
    let vault = Vault::with_config(engine, config());
    assert!(!vault.is_unlocked());
    vault.unlock_with_password("mypassword").unwrap();
    assert_eq!(vault.get("key1").unwrap().unwrap().data, b"value1");
    assert_eq!(vault.status().unwrap().pending, 4);
}

// ── Errors ──────────────────────────────────────────────────────

#[test]
fn vault_error_display() {
    let errors = vec![
        VaultError::Locked,
        VaultError::NotSetup,
        VaultError::AlreadySetup,
        VaultError::InvalidPassword,
        VaultError::InvalidKey,
        VaultError::PasswordTooShort { min: 8 },
        VaultError::InvalidId("a/b".to_string()),
        VaultError::ProvisionNotFound("p".to_string()),
        VaultError::LastProvision,
        VaultError::NoRemote,
        VaultError::NoRemoteKey,
        VaultError::OutOfOrder { expected: 2, got: 3 },
        VaultError::Cancelled,
        VaultError::Remote("down".to_string()),
        VaultError::InvalidRecord("bad".to_string()),
    ];
    for err in &errors {
        assert!(!err.to_string().is_empty());
    }
    assert_eq!(
        VaultError::OutOfOrder { expected: 2, got: 3 }.to_string(),
        "out of order: expected sequence 2, got 3"
    );
    assert_eq!(VaultError::InvalidId("a/b".to_string()).to_string(), r#"invalid id: "a/b""#);
}

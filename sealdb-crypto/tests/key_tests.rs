use sealdb_crypto::{
    CryptoError, KEY_SIZE, KdfParams, SALT_SIZE, Salt, SecretKey, derive_key, unwrap_key,
    unwrap_key_with_password, wrap_key, wrap_key_with_password,
};

#[test]
fn derive_key_is_deterministic() {
    let salt = Salt::random();
    let params = KdfParams::insecure_fast();
    let k1 = derive_key("password", &salt, &params).unwrap();
    let k2 = derive_key("password", &salt, &params).unwrap();
    assert_eq!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn different_salts_produce_different_keys() {
    let params = KdfParams::insecure_fast();
    let k1 = derive_key("password", &Salt::random(), &params).unwrap();
    let k2 = derive_key("password", &Salt::random(), &params).unwrap();
    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn invalid_kdf_params_fail() {
    let params = KdfParams {
        memory_cost: 0,
        time_cost: 0,
        parallelism: 0,
    };
    let err = derive_key("password", &Salt::random(), &params).unwrap_err();
    assert!(matches!(err, CryptoError::KeyDerivation(_)));
}

#[test]
fn default_params_match_owasp() {
    let params = KdfParams::default();
    assert_eq!(params.memory_cost, 19 * 1024);
    assert_eq!(params.time_cost, 2);
    assert_eq!(params.parallelism, 1);
}

#[test]
fn key_from_slice_checks_length() {
    assert!(SecretKey::from_slice(&[7u8; KEY_SIZE]).is_ok());
    let err = SecretKey::from_slice(&[7u8; 5]).unwrap_err();
    assert!(matches!(
        err,
        CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: 5
        }
    ));
}

#[test]
fn salt_from_slice_checks_length() {
    let salt = Salt::from_slice(&[1u8; SALT_SIZE]).unwrap();
    assert_eq!(salt.as_bytes(), &[1u8; SALT_SIZE]);
    assert!(matches!(
        Salt::from_slice(&[1u8; 3]),
        Err(CryptoError::InvalidSaltLength { .. })
    ));
}

#[test]
fn debug_redacts_key_bytes() {
    let key = SecretKey::from_bytes([0xAB; KEY_SIZE]);
    let debug = format!("{key:?}");
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("171"));
}

#[test]
fn subkeys_depend_on_context() {
    let key = SecretKey::random();
    assert_eq!(key.derive("records"), key.derive("records"));
    assert_ne!(key.derive("records"), key.derive("items"));
    assert_ne!(key.derive("records"), key);
}

#[test]
fn fingerprint_is_stable_and_distinct() {
    let a = SecretKey::from_bytes([1u8; KEY_SIZE]);
    let b = SecretKey::from_bytes([2u8; KEY_SIZE]);
    assert_eq!(a.fingerprint(), a.clone().fingerprint());
    assert_ne!(a.fingerprint(), b.fingerprint());
}

// ── Wrapping ─────────────────────────────────────────────────────

#[test]
fn wrap_unwrap_roundtrip() {
    let kek = SecretKey::random();
    let master = SecretKey::random();
    let wrapped = wrap_key(&kek, &master).unwrap();
    assert_eq!(unwrap_key(&kek, &wrapped).unwrap(), master);
}

#[test]
fn unwrap_with_wrong_kek_fails() {
    let wrapped = wrap_key(&SecretKey::random(), &SecretKey::random()).unwrap();
    assert!(matches!(
        unwrap_key(&SecretKey::random(), &wrapped),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn password_wrap_roundtrip() {
    let salt = Salt::random();
    let params = KdfParams::insecure_fast();
    let master = SecretKey::random();
    let wrapped = wrap_key_with_password("hunter22", &salt, &params, &master).unwrap();

    let opened = unwrap_key_with_password("hunter22", &salt, &params, &wrapped).unwrap();
    assert_eq!(opened, master);
    assert!(unwrap_key_with_password("hunter23", &salt, &params, &wrapped).is_err());
}

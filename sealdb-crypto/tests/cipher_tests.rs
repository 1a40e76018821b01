use sealdb_crypto::{
    EncryptedData, NONCE_SIZE, SecretKey, TAG_SIZE, decrypt, decrypt_with_aad, encrypt,
    encrypt_with_aad, open, seal,
};

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = SecretKey::random();
    let plaintext = b"Hello, World!";
    let encrypted = encrypt(&key, plaintext).unwrap();
    let decrypted = decrypt(&key, &encrypted).unwrap();
    assert_eq!(decrypted, plaintext);
}

#[test]
fn encrypt_decrypt_empty() {
    let key = SecretKey::random();
    let encrypted = encrypt(&key, b"").unwrap();
    assert_eq!(encrypted.ciphertext.len(), TAG_SIZE);
    let decrypted = decrypt(&key, &encrypted).unwrap();
    assert_eq!(decrypted, b"");
}

#[test]
fn wrong_key_fails_decryption() {
    let key1 = SecretKey::random();
    let key2 = SecretKey::random();
    let encrypted = encrypt(&key1, b"Secret").unwrap();
    assert!(decrypt(&key2, &encrypted).is_err());
}

#[test]
fn tampered_data_fails_decryption() {
    let key = SecretKey::random();
    let mut encrypted = encrypt(&key, b"Secret").unwrap();
    encrypted.ciphertext[0] ^= 0xFF;
    assert!(decrypt(&key, &encrypted).is_err());
}

#[test]
fn same_plaintext_produces_different_ciphertext() {
    let key = SecretKey::random();
    let e1 = encrypt(&key, b"Same").unwrap();
    let e2 = encrypt(&key, b"Same").unwrap();
    assert_ne!(e1.nonce, e2.nonce);
    assert_ne!(e1.ciphertext, e2.ciphertext);
}

// ── Associated data ──────────────────────────────────────────────

#[test]
fn aad_must_match() {
    let key = SecretKey::random();
    let encrypted = encrypt_with_aad(&key, b"payload", b"/test/key1").unwrap();
    assert_eq!(
        decrypt_with_aad(&key, &encrypted, b"/test/key1").unwrap(),
        b"payload"
    );
    assert!(decrypt_with_aad(&key, &encrypted, b"/test/key2").is_err());
    assert!(decrypt(&key, &encrypted).is_err());
}

#[test]
fn seal_open_roundtrip() {
    let key = SecretKey::random();
    let sealed = seal(&key, b"value", b"ctx").unwrap();
    assert_eq!(sealed.len(), NONCE_SIZE + 5 + TAG_SIZE);
    assert_eq!(open(&key, &sealed, b"ctx").unwrap(), b"value");
}

#[test]
fn open_rejects_short_input() {
    let key = SecretKey::random();
    assert!(open(&key, &[0u8; NONCE_SIZE], b"").is_err());
    assert!(open(&key, &[], b"").is_err());
}

// ── EncryptedData ────────────────────────────────────────────────

#[test]
fn encrypted_data_bytes_roundtrip() {
    let key = SecretKey::random();
    let encrypted = encrypt(&key, b"Test data").unwrap();
    let bytes = encrypted.to_bytes();
    assert_eq!(bytes.len(), encrypted.len());
    let restored = EncryptedData::from_bytes(&bytes).unwrap();
    assert_eq!(restored, encrypted);
    assert_eq!(decrypt(&key, &restored).unwrap(), b"Test data");
}

#[test]
fn encrypted_data_is_empty() {
    let data = EncryptedData {
        nonce: [0u8; NONCE_SIZE],
        ciphertext: vec![],
    };
    assert!(data.is_empty());
    assert_eq!(data.len(), NONCE_SIZE);
}

//! Key wrapping.
//!
//! A vault's master key never leaves memory in the clear. Each way of
//! unlocking the vault (a password, a raw key) stores its own sealed copy:
//!
//! 1. Key-encryption key: derived from a password with Argon2id, or supplied
//!    directly
//! 2. Wrapped key: the master key sealed with the key-encryption key
//!
//! Adding or removing an unlock method never re-encrypts vault data.

use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, SecretKey, Salt, derive_key};

const WRAP_AAD: &[u8] = b"sealdb-wrapped-key";

/// Seals `key` with the key-encryption key `kek`.
pub fn wrap_key(kek: &SecretKey, key: &SecretKey) -> CryptoResult<Vec<u8>> {
    cipher::seal(kek, key.as_bytes(), WRAP_AAD)
}

/// Opens a key sealed by [`wrap_key`].
///
/// Fails with [`CryptoError::Decryption`] if `kek` is not the key that
/// wrapped it.
pub fn unwrap_key(kek: &SecretKey, wrapped: &[u8]) -> CryptoResult<SecretKey> {
    let mut bytes = cipher::open(kek, wrapped, WRAP_AAD)?;
    let key = SecretKey::from_slice(&bytes);
    zeroize::Zeroize::zeroize(&mut bytes);
    key.map_err(|_| CryptoError::Decryption("wrapped value is not a key".to_string()))
}

/// Seals `key` under a password.
pub fn wrap_key_with_password(
    password: &str,
    salt: &Salt,
    params: &KdfParams,
    key: &SecretKey,
) -> CryptoResult<Vec<u8>> {
    let kek = derive_key(password, salt, params)?;
    wrap_key(&kek, key)
}

/// Opens a key sealed by [`wrap_key_with_password`].
pub fn unwrap_key_with_password(
    password: &str,
    salt: &Salt,
    params: &KdfParams,
    wrapped: &[u8],
) -> CryptoResult<SecretKey> {
    let kek = derive_key(password, salt, params)?;
    unwrap_key(&kek, wrapped)
}

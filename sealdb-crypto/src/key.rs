//! Key derivation and management.
//!
//! Uses Argon2id for deriving keys from passwords and SHA-256 for deriving
//! purpose-bound subkeys from existing secret keys.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of secret keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Size of salt in bytes.
pub const SALT_SIZE: usize = 16;

/// A symmetric secret key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key })
    }

    /// Generates a random key.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derives a subkey bound to `context`.
    ///
    /// Different contexts yield unrelated keys, so one root key can seal
    /// several kinds of data without reusing key material.
    pub fn derive(&self, context: &str) -> SecretKey {
        let mut hasher = Sha256::new();
        hasher.update(b"sealdb-subkey");
        hasher.update((context.len() as u64).to_be_bytes());
        hasher.update(context.as_bytes());
        hasher.update(self.bytes);
        let digest = hasher.finalize();
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&digest);
        SecretKey { bytes }
    }

    /// Public fingerprint of the key (SHA-256 of the key bytes).
    ///
    /// Safe to disclose: identifies the key without revealing it.
    pub fn fingerprint(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Salt for key derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// Generates a random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a salt from raw bytes.
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a salt from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != SALT_SIZE {
            return Err(CryptoError::InvalidSaltLength {
                expected: SALT_SIZE,
                actual: bytes.len(),
            });
        }
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(bytes);
        Ok(Self { bytes: salt })
    }

    /// Returns the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }
}

/// Key derivation parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendations for Argon2id (2023)
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests. Not for real passwords.
    pub fn insecure_fast() -> Self {
        Self {
            memory_cost: 1024, // 1 MiB
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Derives a key from a password using Argon2id.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<SecretKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut key_bytes)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let key = SecretKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

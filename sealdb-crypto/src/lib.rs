//! Encryption primitives for SealDB.
//!
//! - ChaCha20-Poly1305 sealing with associated data ([`seal`], [`open`])
//! - Argon2id password-based key derivation ([`derive_key`])
//! - Master-key wrapping for password and key unlock ([`wrap_key`])

mod cipher;
mod error;
mod key;
mod wrap;

pub use cipher::{
    EncryptedData, NONCE_SIZE, TAG_SIZE, decrypt, decrypt_with_aad, encrypt, encrypt_with_aad,
    open, seal,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, KdfParams, SALT_SIZE, Salt, SecretKey, derive_key};
pub use wrap::{unwrap_key, unwrap_key_with_password, wrap_key, wrap_key_with_password};

//! Authenticated encryption using ChaCha20-Poly1305.
//!
//! Every call uses a fresh random nonce. The optional associated data binds a
//! ciphertext to its context (a document path, a record kind), so a sealed
//! value copied elsewhere fails to open.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SecretKey;
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::RngCore;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypted data with the nonce needed for decryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    /// The nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_SIZE],
    /// The encrypted ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Returns the total encoded size.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Encodes as `nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Decodes `nonce || ciphertext`.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decryption("data too short".to_string()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let ciphertext = bytes[NONCE_SIZE..].to_vec();

        Ok(Self { nonce, ciphertext })
    }
}

/// Encrypts plaintext.
pub fn encrypt(key: &SecretKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    encrypt_with_aad(key, plaintext, &[])
}

/// Decrypts ciphertext produced by [`encrypt`].
pub fn decrypt(key: &SecretKey, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
    decrypt_with_aad(key, encrypted, &[])
}

/// Encrypts plaintext bound to associated data.
pub fn encrypt_with_aad(
    key: &SecretKey,
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts ciphertext produced by [`encrypt_with_aad`] with the same
/// associated data.
pub fn decrypt_with_aad(
    key: &SecretKey,
    encrypted: &EncryptedData,
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&encrypted.nonce);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: encrypted.ciphertext.as_ref(),
                aad,
            },
        )
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}

/// Encrypts and encodes in one step (`nonce || ciphertext`).
pub fn seal(key: &SecretKey, plaintext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
    Ok(encrypt_with_aad(key, plaintext, aad)?.to_bytes())
}

/// Decodes and decrypts a value produced by [`seal`].
pub fn open(key: &SecretKey, sealed: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
    let encrypted = EncryptedData::from_bytes(sealed)?;
    decrypt_with_aad(key, &encrypted, aad)
}

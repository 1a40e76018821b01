//! Property-based tests for the crypto crate.
//!
//! - Sealing is reversible with the correct key and associated data
//! - Tampering is detected
//! - Wrapped keys only open with their key-encryption key

use proptest::prelude::*;
use sealdb_crypto::{SecretKey, open, seal, unwrap_key, wrap_key};

fn key_strategy() -> impl Strategy<Value = SecretKey> {
    prop::array::uniform32(any::<u8>()).prop_map(SecretKey::from_bytes)
}

fn plaintext_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

proptest! {
    #[test]
    fn seal_open_roundtrip(
        key in key_strategy(),
        plaintext in plaintext_strategy(),
        aad in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let sealed = seal(&key, &plaintext, &aad).unwrap();
        prop_assert_eq!(open(&key, &sealed, &aad).unwrap(), plaintext);
    }

    #[test]
    fn any_flipped_byte_is_detected(
        key in key_strategy(),
        plaintext in plaintext_strategy(),
        index in any::<prop::sample::Index>(),
    ) {
        let mut sealed = seal(&key, &plaintext, b"").unwrap();
        let i = index.index(sealed.len());
        sealed[i] ^= 0x01;
        prop_assert!(open(&key, &sealed, b"").is_err());
    }

    #[test]
    fn wrapped_key_needs_its_kek(kek in key_strategy(), other in key_strategy(), master in key_strategy()) {
        prop_assume!(kek != other);
        let wrapped = wrap_key(&kek, &master).unwrap();
        prop_assert_eq!(unwrap_key(&kek, &wrapped).unwrap(), master);
        prop_assert!(unwrap_key(&other, &wrapped).is_err());
    }
}

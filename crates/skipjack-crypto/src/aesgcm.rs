//! AES-GCM-256 AEAD encryption (§6).
//!
//! The nonce is the AES-GCM IV and travels prepended to the ciphertext on
//! the wire, as the datagram composer expects (§4.6): one call to
//! [`seal`] produces exactly what goes on the wire, one call to [`open`]
//! consumes exactly what came off it.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

use crate::{CryptoError, Result};

/// Nonce size for AES-GCM (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for AES-256-GCM (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key` with a fresh random nonce, returning
/// `nonce || ciphertext || tag`.
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    seal_with_nonce(key, &nonce_bytes, plaintext)
}

/// Encrypt with a caller-supplied nonce. The nonce must never be reused
/// with the same key; prefer [`seal`] unless a test needs determinism.
pub fn seal_with_nonce(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let tag_and_ct = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::TagMismatch)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + tag_and_ct.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&tag_and_ct);
    Ok(out)
}

/// Decrypt `nonce || ciphertext || tag` under `key`. On tag mismatch or a
/// buffer too short to contain a nonce, returns an error; callers that
/// must drop silently (the inbound dispatcher, §4.7) map this to their
/// own `decrypt-error` tap rather than propagating it.
pub fn open(key: &[u8; KEY_SIZE], datagram: &[u8]) -> Result<Vec<u8>> {
    if datagram.len() < NONCE_SIZE {
        return Err(CryptoError::Truncated { len: datagram.len() });
    }
    let (nonce, ciphertext) = datagram.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::TagMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let key = [0x42u8; KEY_SIZE];
        let plaintext = b"ping-event";

        let datagram = seal(&key, plaintext).expect("seal");
        assert_eq!(open(&key, &datagram).expect("open"), plaintext);
    }

    #[test]
    fn nonce_is_prepended() {
        let key = [0x42u8; KEY_SIZE];
        let nonce = [0x01u8; NONCE_SIZE];
        let datagram = seal_with_nonce(&key, &nonce, b"hello").expect("seal");
        assert_eq!(&datagram[..NONCE_SIZE], &nonce);
        assert_eq!(datagram.len(), NONCE_SIZE + b"hello".len() + TAG_SIZE);
    }

    #[test]
    fn wrong_key_fails() {
        let key1 = [0x01u8; KEY_SIZE];
        let key2 = [0x02u8; KEY_SIZE];
        let datagram = seal(&key1, b"test").expect("seal");
        assert!(open(&key2, &datagram).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = [0x01u8; KEY_SIZE];
        let mut datagram = seal(&key, b"test").expect("seal");
        let last = datagram.len() - 1;
        datagram[last] ^= 0xFF;
        assert!(matches!(open(&key, &datagram), Err(CryptoError::TagMismatch)));
    }

    #[test]
    fn truncated_datagram_fails() {
        let key = [0x01u8; KEY_SIZE];
        let short = vec![0u8; NONCE_SIZE - 1];
        assert!(matches!(
            open(&key, &short),
            Err(CryptoError::Truncated { .. })
        ));
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = [0x42u8; KEY_SIZE];
        let datagram = seal(&key, b"").expect("seal");
        assert_eq!(datagram.len(), NONCE_SIZE + TAG_SIZE);
        assert_eq!(open(&key, &datagram).expect("open"), b"");
    }
}

//! # skipjack-crypto
//!
//! The cluster wire cipher: AES-GCM-256 with a 12-byte nonce, and the
//! `secret-key = SHA-256(secret-token)` derivation (§6). No algorithm
//! negotiation — the cipher suite is fixed for the whole cluster.
//!
//! ## Modules
//!
//! - [`aesgcm`] — AEAD encrypt/decrypt over a datagram, nonce prepended
//! - [`kdf`] — secret-token to secret-key derivation

pub mod aesgcm;
pub mod kdf;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AEAD decryption failed (authentication tag mismatch).
    #[error("tag mismatch")]
    TagMismatch,

    /// Input was too short to contain a nonce.
    #[error("ciphertext shorter than nonce: {len} bytes")]
    Truncated { len: usize },

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, CryptoError>;

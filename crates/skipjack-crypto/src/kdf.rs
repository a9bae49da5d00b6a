//! Cluster secret-key derivation (§3 `Cluster.secret-key`).
//!
//! `secret-key = SHA-256(secret-token)`, used directly as the 32-byte
//! AES-256-GCM key. Derivation happens once, at cluster construction.

use sha2::{Digest, Sha256};

/// Derive the 32-byte cluster secret-key from an arbitrary-length secret
/// token.
pub fn derive_secret_key(secret_token: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret_token);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = derive_secret_key(b"cluster-secret");
        let b = derive_secret_key(b"cluster-secret");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_tokens_diverge() {
        let a = derive_secret_key(b"token-a");
        let b = derive_secret_key(b"token-b");
        assert_ne!(a, b);
    }

    #[test]
    fn output_is_32_bytes() {
        assert_eq!(derive_secret_key(b"x").len(), 32);
    }
}

//! The encrypted datagram: serialize, then AES-GCM-seal (§6).
//!
//! `encode` is what the datagram composer (§4.6) calls after building its
//! `Value` tree; `decode` is what the inbound dispatcher (§4.7) calls
//! before routing. Neither function knows what a `cmd-type` is.

use skipjack_crypto::aesgcm;

use crate::value::Value;
use crate::{serializer, Result, WireError};

/// Serialize `value` and seal it under `key`. If `max_size` is set and
/// the resulting datagram would exceed it, fails with
/// [`WireError::PacketTooBig`] instead of returning bytes — the caller
/// (the composer) decides whether an override flag should skip this
/// check by passing `None`.
pub fn encode(value: &Value, key: &[u8; 32], max_size: Option<usize>) -> Result<Vec<u8>> {
    let plaintext = serializer::to_vec(value)?;
    let datagram = aesgcm::seal(key, &plaintext).map_err(|_| WireError::DecryptError)?;

    if let Some(max) = max_size {
        if datagram.len() > max {
            return Err(WireError::PacketTooBig {
                len: datagram.len(),
                max,
            });
        }
    }
    Ok(datagram)
}

/// Open and deserialize a received datagram. A tag mismatch maps to
/// [`WireError::DecryptError`]; callers must drop silently and emit a
/// `decrypt-error` tap rather than propagate (§4.7).
pub fn decode(datagram: &[u8], key: &[u8; 32]) -> Result<Value> {
    let plaintext = aesgcm::open(key, datagram).map_err(|_| WireError::DecryptError)?;
    serializer::from_slice(&plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let key = [0x11u8; 32];
        let value = Value::Array(vec![Value::Integer(0.into()), Value::Text("x".into())]);

        let datagram = encode(&value, &key, None).expect("encode");
        let restored = decode(&datagram, &key).expect("decode");
        assert_eq!(value, restored);
    }

    #[test]
    fn oversized_datagram_is_rejected() {
        let key = [0x11u8; 32];
        let value = Value::Bytes(vec![0u8; 2000]);
        assert!(matches!(
            encode(&value, &key, Some(1432)),
            Err(WireError::PacketTooBig { .. })
        ));
    }

    #[test]
    fn override_flag_skips_size_check() {
        let key = [0x11u8; 32];
        let value = Value::Bytes(vec![0u8; 2000]);
        assert!(encode(&value, &key, None).is_ok());
    }

    #[test]
    fn tampered_datagram_fails_to_decrypt() {
        let key = [0x11u8; 32];
        let value = Value::Integer(1.into());
        let mut datagram = encode(&value, &key, None).expect("encode");
        let last = datagram.len() - 1;
        datagram[last] ^= 0xFF;
        assert!(matches!(decode(&datagram, &key), Err(WireError::DecryptError)));
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let key1 = [0x01u8; 32];
        let key2 = [0x02u8; 32];
        let datagram = encode(&Value::Null, &key1, None).expect("encode");
        assert!(matches!(decode(&datagram, &key2), Err(WireError::DecryptError)));
    }
}

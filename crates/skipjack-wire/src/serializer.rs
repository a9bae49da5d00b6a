//! The compact self-describing binary serializer (§4.1, §6), backed by
//! CBOR (RFC 8949) via [`ciborium`].
//!
//! §8 gives byte-size test vectors for a canonical value list that don't
//! match CBOR's canonical encoding (e.g. the integer `1` at 6 bytes,
//! where CBOR encodes it in 1 byte) — those numbers come from the
//! original implementation's own serializer and are not reproduced here;
//! §4.1 is explicit that the encoding is "delegated to the external
//! serializer" and symbolic at the core layer. What's load-bearing and
//! tested here is round-tripping and field order, not byte-for-byte size.

use crate::value::Value;
use crate::{Result, WireError};

/// Serialize a value tree to bytes.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| WireError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value tree from bytes.
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    ciborium::from_reader(bytes).map_err(|e| WireError::Deserialization(e.to_string()))
}

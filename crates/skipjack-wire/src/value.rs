//! The generic value tree the serializer moves, and UUID helpers.
//!
//! `Value` is [`ciborium::value::Value`] directly, not a newtype — the
//! serializer has no opinion on shape beyond "primitives, strings, byte
//! strings, ordered sequences and maps", which CBOR's value model already
//! is. UUIDs are carried as 16-byte byte strings (§6: "UUIDs serialize as
//! 16-byte values").

use uuid::Uuid;

use crate::{Result, WireError};

pub type Value = ciborium::value::Value;

/// Encode a UUID as a 16-byte value.
pub fn uuid_to_value(id: Uuid) -> Value {
    Value::Bytes(id.as_bytes().to_vec())
}

/// Decode a 16-byte value back into a UUID.
pub fn value_to_uuid(value: &Value) -> Result<Uuid> {
    let bytes = value.as_bytes().ok_or(WireError::MalformedUuid)?;
    let array: [u8; 16] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| WireError::MalformedUuid)?;
    Ok(Uuid::from_bytes(array))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_roundtrips() {
        let id = Uuid::new_v4();
        let value = uuid_to_value(id);
        assert_eq!(value_to_uuid(&value).expect("decode"), id);
    }

    #[test]
    fn non_bytes_value_is_malformed() {
        let value = Value::Integer(1.into());
        assert!(matches!(value_to_uuid(&value), Err(WireError::MalformedUuid)));
    }

    #[test]
    fn wrong_length_bytes_is_malformed() {
        let value = Value::Bytes(vec![0u8; 8]);
        assert!(matches!(value_to_uuid(&value), Err(WireError::MalformedUuid)));
    }
}

//! The small, bounded key/value payload nodes may attach to themselves
//! (§3 `Node.payload`, §6 `max-payload-size`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar payload value. Kept intentionally small — the payload exists for
/// things like advertising a service port (`tcp-port`), not general-purpose
/// data exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Int(i64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
}

/// A node's self-reported payload map.
pub type Payload = BTreeMap<String, PayloadValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_holds_mixed_scalars() {
        let mut p: Payload = Payload::new();
        p.insert("tcp-port".to_string(), PayloadValue::Int(4567));
        p.insert("relay".to_string(), PayloadValue::Bool(true));
        assert_eq!(p.get("tcp-port"), Some(&PayloadValue::Int(4567)));
    }
}

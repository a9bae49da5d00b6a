//! The compact neighbour tuple used in anti-entropy digests (§3, §8).

use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::status::{AccessMode, NodeStatus};
use crate::NodeId;

/// One entry of an anti-entropy digest: `[id, host, port, status-code,
/// access-code, restart-counter, tx, payload]`.
///
/// Field order here is the wire contract (§4.1) — `skipjack-wire` encodes
/// these fields positionally, in this order, and must not be reordered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighbourDigest {
    pub id: NodeId,
    pub host: String,
    pub port: u16,
    pub status: NodeStatus,
    pub access: AccessMode,
    pub restart_counter: u64,
    pub tx: u64,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn field_order_matches_spec_example() {
        let mut payload = Payload::new();
        payload.insert(
            "tcp-port".to_string(),
            crate::payload::PayloadValue::Int(4567),
        );
        let digest = NeighbourDigest {
            id: Uuid::nil(),
            host: "127.0.0.1".to_string(),
            port: 5377,
            status: NodeStatus::Alive,
            access: AccessMode::Direct,
            restart_counter: 3,
            tx: 0,
            payload,
        };
        assert_eq!(digest.status.code(), 3);
        assert_eq!(digest.access.code(), 0);
    }
}

//! The node actor state (§3 Node, §4.2 status machine, §5).

use std::collections::{HashMap, VecDeque};

use skipjack_types::event::ProbeAck;
use skipjack_types::{Event, NodeId, NodeStatus, Payload};

use crate::cluster::Cluster;
use crate::error::{CoreError, Result};
use crate::neighbour::NeighbourTable;
use crate::outgoing::OutgoingBuffer;
use crate::transport::Transport;
use skipjack_types::SkipjackConfig;

/// A single node's complete protocol-engine state (§3).
///
/// Owned exclusively by the protocol actor (§5): every field here is
/// mutated only from within the actor, never shared behind a lock.
pub struct Node<T: Transport> {
    pub id: NodeId,
    pub host: String,
    pub port: u16,
    pub cluster: Cluster,
    pub status: NodeStatus,
    pub restart_counter: u64,
    pub tx: u64,
    pub neighbours: NeighbourTable,
    pub outgoing: OutgoingBuffer,
    pub ping_round_buffer: VecDeque<NodeId>,
    pub ping_events: HashMap<NodeId, skipjack_types::event::Ping>,
    pub ping_sent_at: HashMap<NodeId, u64>,
    pub indirect_ping_events: HashMap<NodeId, skipjack_types::event::IndirectPing>,
    pub indirect_ping_sent_at: HashMap<NodeId, u64>,
    pub probe_events: HashMap<NodeId, Option<ProbeAck>>,
    pub payload: Payload,
    pub config: SkipjackConfig,
    pub(crate) transport: T,
}

impl<T: Transport> Node<T> {
    /// Construct a node in `stop` status (§3 lifecycle: "created from
    /// config").
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: NodeId,
        host: impl Into<String>,
        port: u16,
        cluster: Cluster,
        config: SkipjackConfig,
        transport: T,
    ) -> Self {
        Self {
            id,
            host: host.into(),
            port,
            cluster,
            status: NodeStatus::Stop,
            restart_counter: 0,
            tx: 0,
            neighbours: NeighbourTable::new(),
            outgoing: OutgoingBuffer::new(),
            ping_round_buffer: VecDeque::new(),
            ping_events: HashMap::new(),
            ping_sent_at: HashMap::new(),
            indirect_ping_events: HashMap::new(),
            indirect_ping_sent_at: HashMap::new(),
            probe_events: HashMap::new(),
            payload: Payload::new(),
            config,
            transport,
        }
    }

    /// Increment and return the node's `tx`. Every event builder calls
    /// this exactly once (§4.4).
    pub(crate) fn next_tx(&mut self) -> u64 {
        self.tx += 1;
        self.tx
    }

    pub fn is_alive_ish(&self) -> bool {
        self.status.is_alive_ish()
    }

    /// `alive` plus `join`: the statuses a node may address itself as
    /// the "current" member view under (used by the join fast path for
    /// `cluster-size = 1`, and by bootstrap checks).
    pub fn nodes_in_cluster(&self) -> usize {
        self.neighbours.len() + 1
    }

    /// Raw status setter enforcing the transition matrix of §4.2.
    pub fn set_status(&mut self, new: NodeStatus) -> Result<()> {
        use NodeStatus::*;
        let allowed = match (self.status, new) {
            (_, Dead) => true,
            (_, Stop) => true,
            // §4.2 names only stop->join, but §4.10's join algorithm treats
            // `left` as an equally valid pre-join state (rejoin after a
            // graceful leave) — see DESIGN.md.
            (Stop, Join) | (Left, Join) => true,
            (Join, Alive) => true,
            (Alive, Suspect) | (Suspect, Alive) => true,
            (Alive, Left) => true,
            (same, other) if same == other => true,
            _ => false,
        };
        if !allowed {
            return Err(CoreError::InvalidEvent {
                kind: "status-transition",
            });
        }
        self.status = new;
        Ok(())
    }

    /// `set-cluster-size`: only while `stop` (§3 "cluster mutable only
    /// while owning Node is in `stop` status").
    pub fn set_cluster_size(&mut self, new_size: u64) -> Result<()> {
        if self.status != NodeStatus::Stop {
            return Err(CoreError::InvalidEvent {
                kind: "cluster-size-not-stopped",
            });
        }
        self.cluster.cluster_size = new_size;
        Ok(())
    }

    /// `set-payload`: validates against `max-payload-size` (§6, §7
    /// `payload-size-too-big`).
    pub fn set_payload(&mut self, payload: Payload) -> Result<()> {
        let encoded = crate::codec::payload_to_value(&payload);
        let size = skipjack_wire::serializer::to_vec(&encoded)?.len();
        if size > self.config.max_payload_size {
            return Err(CoreError::PayloadSizeTooBig {
                size,
                max: self.config.max_payload_size,
            });
        }
        self.payload = payload;
        Ok(())
    }

    /// Put a built event directly onto the outgoing buffer for piggyback
    /// dissemination (§4.5, §9 "Dissemination via piggyback").
    pub fn disseminate(&mut self, event: Event) {
        self.outgoing.put_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::transport::test_util::RecordingTransport;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn test_node() -> Node<RecordingTransport> {
        let cluster = Cluster::new(
            Uuid::new_v4(),
            "c",
            "",
            "",
            b"secret",
            3,
            BTreeSet::new(),
        );
        Node::new(
            Uuid::new_v4(),
            "127.0.0.1",
            5376,
            cluster,
            SkipjackConfig::default(),
            RecordingTransport::default(),
        )
    }

    #[test]
    fn starts_in_stop_status() {
        assert_eq!(test_node().status, NodeStatus::Stop);
    }

    #[test]
    fn stop_to_join_is_allowed_only_via_explicit_transition() {
        let mut node = test_node();
        assert!(node.set_status(NodeStatus::Join).is_ok());
        assert!(node.set_status(NodeStatus::Alive).is_ok());
    }

    #[test]
    fn stop_to_alive_directly_is_rejected() {
        let mut node = test_node();
        assert!(node.set_status(NodeStatus::Alive).is_err());
    }

    #[test]
    fn cluster_size_immutable_once_started() {
        let mut node = test_node();
        node.set_status(NodeStatus::Join).unwrap();
        node.set_status(NodeStatus::Alive).unwrap();
        assert!(node.set_cluster_size(5).is_err());
    }

    #[test]
    fn payload_over_limit_is_rejected() {
        let mut node = test_node();
        node.config.max_payload_size = 4;
        let mut payload = Payload::new();
        payload.insert(
            "tcp-port".to_string(),
            skipjack_types::PayloadValue::Int(4567),
        );
        assert!(matches!(
            node.set_payload(payload),
            Err(CoreError::PayloadSizeTooBig { .. })
        ));
    }
}

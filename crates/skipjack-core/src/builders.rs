//! Event builders (§4.4).
//!
//! Each builder increments the node's `tx` exactly once, validates its
//! arguments against the structural schema of §3, and stamps the event
//! with the node's current `(id, restart-counter, tx)`.

use rand::seq::IteratorRandom;
use skipjack_types::event::{
    Ack, Alive, AntiEntropy, Dead, IndirectAck, IndirectPing, Join, Left, NewClusterSize,
    PayloadEvent, Ping, Probe, ProbeAck, Sender, Suspect,
};
use skipjack_types::{NeighbourDigest, NodeId};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::node::Node;
use crate::transport::Transport;

/// Selects which neighbours to include in an anti-entropy digest (§4.4).
pub enum AntiEntropySelector {
    /// Up to `n` randomly chosen neighbours.
    Random(usize),
    /// A single named neighbour. An unknown id yields an empty digest.
    Neighbour(NodeId),
}

fn non_empty(s: &str) -> bool {
    !s.is_empty()
}

fn non_zero_port(p: u16) -> bool {
    p != 0
}

impl<T: Transport> Node<T> {
    fn sender(&mut self) -> Sender {
        Sender {
            id: self.id,
            restart_counter: self.restart_counter,
            tx: self.next_tx(),
        }
    }

    pub fn build_ping(&mut self, neighbour_id: NodeId, attempt_number: u32) -> Result<Ping> {
        if neighbour_id.is_nil() || attempt_number == 0 || !non_empty(&self.host) || !non_zero_port(self.port) {
            return Err(CoreError::InvalidEvent { kind: "ping" });
        }
        let sender = self.sender();
        Ok(Ping {
            sender,
            host: self.host.clone(),
            port: self.port,
            neighbour_id,
            attempt_number,
        })
    }

    pub fn build_ack(&mut self, neighbour_id: NodeId, neighbour_tx: u64) -> Result<Ack> {
        if neighbour_id.is_nil() {
            return Err(CoreError::InvalidEvent { kind: "ack" });
        }
        let sender = self.sender();
        Ok(Ack {
            sender,
            neighbour_id,
            neighbour_tx,
        })
    }

    pub fn build_join(&mut self) -> Result<Join> {
        if !non_empty(&self.host) || !non_zero_port(self.port) {
            return Err(CoreError::InvalidEvent { kind: "join" });
        }
        let sender = self.sender();
        Ok(Join {
            sender,
            host: self.host.clone(),
            port: self.port,
        })
    }

    pub fn build_alive(
        &mut self,
        neighbour_id: NodeId,
        neighbour_restart_counter: u64,
        neighbour_tx: u64,
    ) -> Result<Alive> {
        if neighbour_id.is_nil() {
            return Err(CoreError::InvalidEvent { kind: "alive-event" });
        }
        let sender = self.sender();
        Ok(Alive {
            sender,
            neighbour_id,
            neighbour_restart_counter,
            neighbour_tx,
        })
    }

    pub fn build_suspect(
        &mut self,
        neighbour_id: NodeId,
        neighbour_restart_counter: u64,
        neighbour_tx: u64,
    ) -> Result<Suspect> {
        if neighbour_id.is_nil() {
            return Err(CoreError::InvalidEvent { kind: "suspect-event" });
        }
        let sender = self.sender();
        Ok(Suspect {
            sender,
            neighbour_id,
            neighbour_restart_counter,
            neighbour_tx,
        })
    }

    pub fn build_left(&mut self) -> Left {
        let sender = self.sender();
        Left { sender }
    }

    pub fn build_dead(
        &mut self,
        neighbour_id: NodeId,
        neighbour_restart_counter: u64,
        neighbour_tx: u64,
    ) -> Result<Dead> {
        if neighbour_id.is_nil() {
            return Err(CoreError::InvalidEvent { kind: "dead-event" });
        }
        let sender = self.sender();
        Ok(Dead {
            sender,
            neighbour_id,
            neighbour_restart_counter,
            neighbour_tx,
        })
    }

    pub fn build_payload_event(&mut self) -> PayloadEvent {
        let payload = self.payload.clone();
        let sender = self.sender();
        PayloadEvent { sender, payload }
    }

    /// The anti-entropy digest builder (§4.4). An unknown selected
    /// neighbour id yields an empty digest rather than an error.
    pub fn build_anti_entropy(&mut self, selector: AntiEntropySelector) -> AntiEntropy {
        let anti_entropy_data: Vec<NeighbourDigest> = match selector {
            AntiEntropySelector::Neighbour(id) => self
                .neighbours
                .get(&id)
                .map(|n| neighbour_digest(n))
                .into_iter()
                .collect(),
            AntiEntropySelector::Random(n) => {
                let mut rng = rand::thread_rng();
                self.neighbours
                    .iter()
                    .choose_multiple(&mut rng, n)
                    .into_iter()
                    .map(neighbour_digest)
                    .collect()
            }
        };
        let sender = self.sender();
        AntiEntropy {
            sender,
            anti_entropy_data,
        }
    }

    /// Convenience: the configured default sample size
    /// (`max-anti-entropy-items`).
    pub fn build_anti_entropy_default(&mut self) -> AntiEntropy {
        let n = self.config.max_anti_entropy_items;
        self.build_anti_entropy(AntiEntropySelector::Random(n))
    }

    pub fn build_probe(
        &mut self,
        neighbour_host: impl Into<String>,
        neighbour_port: u16,
    ) -> Result<Probe> {
        let neighbour_host = neighbour_host.into();
        if !non_empty(&self.host)
            || !non_zero_port(self.port)
            || !non_empty(&neighbour_host)
            || !non_zero_port(neighbour_port)
        {
            return Err(CoreError::InvalidEvent { kind: "probe" });
        }
        let probe_key = Uuid::new_v4();
        let sender = self.sender();
        Ok(Probe {
            sender,
            host: self.host.clone(),
            port: self.port,
            neighbour_host,
            neighbour_port,
            probe_key,
        })
    }

    pub fn build_probe_ack(
        &mut self,
        status: skipjack_types::NodeStatus,
        neighbour_id: NodeId,
        neighbour_tx: u64,
        probe_key: Uuid,
    ) -> Result<ProbeAck> {
        if neighbour_id.is_nil() || probe_key.is_nil() || !non_empty(&self.host) || !non_zero_port(self.port) {
            return Err(CoreError::InvalidEvent { kind: "probe-ack" });
        }
        let sender = self.sender();
        Ok(ProbeAck {
            sender,
            host: self.host.clone(),
            port: self.port,
            status,
            neighbour_id,
            neighbour_tx,
            probe_key,
        })
    }

    pub fn build_new_cluster_size(
        &mut self,
        old_cluster_size: u64,
        new_cluster_size: u64,
    ) -> Result<NewClusterSize> {
        if old_cluster_size == 0 || new_cluster_size == 0 {
            return Err(CoreError::InvalidEvent {
                kind: "cluster-size-event",
            });
        }
        let sender = self.sender();
        Ok(NewClusterSize {
            sender,
            old_cluster_size,
            new_cluster_size,
        })
    }

    pub fn build_indirect_ping(
        &mut self,
        intermediate_id: NodeId,
        neighbour_id: NodeId,
        attempt_number: u32,
    ) -> Result<IndirectPing> {
        let intermediate = self
            .neighbours
            .get(&intermediate_id)
            .ok_or(CoreError::UnknownIntermediateNode)?;
        let neighbour = self
            .neighbours
            .get(&neighbour_id)
            .ok_or(CoreError::UnknownNeighbourNode)?;
        if attempt_number == 0 || !non_empty(&self.host) || !non_zero_port(self.port) {
            return Err(CoreError::InvalidEvent {
                kind: "indirect-ping",
            });
        }
        let (intermediate_host, intermediate_port) = (intermediate.host.clone(), intermediate.port);
        let (neighbour_host, neighbour_port) = (neighbour.host.clone(), neighbour.port);
        let sender = self.sender();
        Ok(IndirectPing {
            sender,
            host: self.host.clone(),
            port: self.port,
            intermediate_id,
            intermediate_host,
            intermediate_port,
            neighbour_id,
            neighbour_host,
            neighbour_port,
            attempt_number,
        })
    }

    pub fn build_indirect_ack(
        &mut self,
        intermediate_id: NodeId,
        intermediate_host: impl Into<String>,
        intermediate_port: u16,
        neighbour_id: NodeId,
        neighbour_host: impl Into<String>,
        neighbour_port: u16,
        status: skipjack_types::NodeStatus,
    ) -> Result<IndirectAck> {
        let intermediate_host = intermediate_host.into();
        let neighbour_host = neighbour_host.into();
        if !non_empty(&self.host)
            || !non_zero_port(self.port)
            || !non_empty(&intermediate_host)
            || !non_zero_port(intermediate_port)
            || !non_empty(&neighbour_host)
            || !non_zero_port(neighbour_port)
        {
            return Err(CoreError::InvalidEvent {
                kind: "indirect-ack",
            });
        }
        let sender = self.sender();
        Ok(IndirectAck {
            sender,
            host: self.host.clone(),
            port: self.port,
            intermediate_id,
            intermediate_host,
            intermediate_port,
            neighbour_id,
            neighbour_host,
            neighbour_port,
            status,
        })
    }
}

fn neighbour_digest(n: &crate::neighbour::Neighbour) -> NeighbourDigest {
    NeighbourDigest {
        id: n.id,
        host: n.host.clone(),
        port: n.port,
        status: n.status,
        access: n.access,
        restart_counter: n.restart_counter,
        tx: n.tx,
        payload: n.payload.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::transport::test_util::RecordingTransport;
    use skipjack_types::SkipjackConfig;
    use std::collections::BTreeSet;

    fn test_node() -> Node<RecordingTransport> {
        let cluster = Cluster::new(Uuid::new_v4(), "c", "", "", b"s", 10, BTreeSet::new());
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
    fn build_ping_increments_tx_once() {
        let mut node = test_node();
        let before = node.tx;
        let ping = node.build_ping(Uuid::new_v4(), 1).unwrap();
        assert_eq!(node.tx, before + 1);
        assert_eq!(ping.sender.tx, node.tx);
    }

    #[test]
    fn build_ping_rejects_nil_neighbour() {
        let mut node = test_node();
        assert!(matches!(
            node.build_ping(Uuid::nil(), 1),
            Err(CoreError::InvalidEvent { kind: "ping" })
        ));
    }

    #[test]
    fn indirect_ping_requires_known_intermediate_and_neighbour() {
        let mut node = test_node();
        let intermediate = Uuid::new_v4();
        let neighbour = Uuid::new_v4();
        assert!(matches!(
            node.build_indirect_ping(intermediate, neighbour, 1),
            Err(CoreError::UnknownIntermediateNode)
        ));
    }

    #[test]
    fn anti_entropy_unknown_neighbour_is_empty_not_error() {
        let mut node = test_node();
        let ae = node.build_anti_entropy(AntiEntropySelector::Neighbour(Uuid::new_v4()));
        assert!(ae.anti_entropy_data.is_empty());
    }

    #[test]
    fn new_cluster_size_rejects_zero() {
        let mut node = test_node();
        assert!(matches!(
            node.build_new_cluster_size(0, 3),
            Err(CoreError::InvalidEvent {
                kind: "cluster-size-event"
            })
        ));
    }
}

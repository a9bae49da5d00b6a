//! The thirteen wire event variants (§3) as a tagged union.
//!
//! Every variant carries the sender's id, restart-counter and tx (the
//! sender's incarnation) plus its own distinguishing fields. `cmd-type` is
//! not stored on the value itself — it is recovered from the variant via
//! [`Event::cmd_type`] and re-attached by the codec on prepare (§4.1).

use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::status::NodeStatus;
use crate::NodeId;

/// `cmd-type` tags (§3). 12 and 13 are reserved and never emitted.
pub const CMD_PING: u8 = 0;
pub const CMD_ACK: u8 = 1;
pub const CMD_JOIN: u8 = 2;
pub const CMD_ALIVE: u8 = 3;
pub const CMD_SUSPECT: u8 = 4;
pub const CMD_LEFT: u8 = 5;
pub const CMD_DEAD: u8 = 6;
pub const CMD_PAYLOAD: u8 = 7;
pub const CMD_ANTI_ENTROPY: u8 = 8;
pub const CMD_PROBE: u8 = 9;
pub const CMD_PROBE_ACK: u8 = 10;
pub const CMD_NEW_CLUSTER_SIZE: u8 = 11;
pub const CMD_INDIRECT_PING: u8 = 14;
pub const CMD_INDIRECT_ACK: u8 = 15;

/// Fields common to every event: the sender's id and incarnation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: NodeId,
    pub restart_counter: u64,
    pub tx: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub sender: Sender,
    pub host: String,
    pub port: u16,
    pub neighbour_id: NodeId,
    pub attempt_number: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub sender: Sender,
    pub neighbour_id: NodeId,
    pub neighbour_tx: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub sender: Sender,
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alive {
    pub sender: Sender,
    pub neighbour_id: NodeId,
    pub neighbour_restart_counter: u64,
    pub neighbour_tx: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspect {
    pub sender: Sender,
    pub neighbour_id: NodeId,
    pub neighbour_restart_counter: u64,
    pub neighbour_tx: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Left {
    pub sender: Sender,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dead {
    pub sender: Sender,
    pub neighbour_id: NodeId,
    pub neighbour_restart_counter: u64,
    pub neighbour_tx: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadEvent {
    pub sender: Sender,
    pub payload: Payload,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AntiEntropy {
    pub sender: Sender,
    pub anti_entropy_data: Vec<crate::digest::NeighbourDigest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    pub sender: Sender,
    pub host: String,
    pub port: u16,
    pub neighbour_host: String,
    pub neighbour_port: u16,
    pub probe_key: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeAck {
    pub sender: Sender,
    pub host: String,
    pub port: u16,
    pub status: NodeStatus,
    pub neighbour_id: NodeId,
    pub neighbour_tx: u64,
    pub probe_key: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClusterSize {
    pub sender: Sender,
    pub old_cluster_size: u64,
    pub new_cluster_size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndirectPing {
    pub sender: Sender,
    pub host: String,
    pub port: u16,
    pub intermediate_id: NodeId,
    pub intermediate_host: String,
    pub intermediate_port: u16,
    pub neighbour_id: NodeId,
    pub neighbour_host: String,
    pub neighbour_port: u16,
    pub attempt_number: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndirectAck {
    pub sender: Sender,
    pub host: String,
    pub port: u16,
    pub intermediate_id: NodeId,
    pub intermediate_host: String,
    pub intermediate_port: u16,
    pub neighbour_id: NodeId,
    pub neighbour_host: String,
    pub neighbour_port: u16,
    pub status: NodeStatus,
}

/// The full event vocabulary exchanged between skipjack nodes (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Ping(Ping),
    Ack(Ack),
    Join(Join),
    Alive(Alive),
    Suspect(Suspect),
    Left(Left),
    Dead(Dead),
    Payload(PayloadEvent),
    AntiEntropy(AntiEntropy),
    Probe(Probe),
    ProbeAck(ProbeAck),
    NewClusterSize(NewClusterSize),
    IndirectPing(IndirectPing),
    IndirectAck(IndirectAck),
}

impl Event {
    /// The wire `cmd-type` tag for this event (§3).
    pub const fn cmd_type(&self) -> u8 {
        match self {
            Event::Ping(_) => CMD_PING,
            Event::Ack(_) => CMD_ACK,
            Event::Join(_) => CMD_JOIN,
            Event::Alive(_) => CMD_ALIVE,
            Event::Suspect(_) => CMD_SUSPECT,
            Event::Left(_) => CMD_LEFT,
            Event::Dead(_) => CMD_DEAD,
            Event::Payload(_) => CMD_PAYLOAD,
            Event::AntiEntropy(_) => CMD_ANTI_ENTROPY,
            Event::Probe(_) => CMD_PROBE,
            Event::ProbeAck(_) => CMD_PROBE_ACK,
            Event::NewClusterSize(_) => CMD_NEW_CLUSTER_SIZE,
            Event::IndirectPing(_) => CMD_INDIRECT_PING,
            Event::IndirectAck(_) => CMD_INDIRECT_ACK,
        }
    }

    /// A short symbolic name used in taps (e.g. `ping-event`).
    pub const fn tap_name(&self) -> &'static str {
        match self {
            Event::Ping(_) => "ping-event",
            Event::Ack(_) => "ack-event",
            Event::Join(_) => "join-event",
            Event::Alive(_) => "alive-event",
            Event::Suspect(_) => "suspect-event",
            Event::Left(_) => "left-event",
            Event::Dead(_) => "dead-event",
            Event::Payload(_) => "payload-event",
            Event::AntiEntropy(_) => "anti-entropy-event",
            Event::Probe(_) => "probe-event",
            Event::ProbeAck(_) => "probe-ack-event",
            Event::NewClusterSize(_) => "new-cluster-size-event",
            Event::IndirectPing(_) => "indirect-ping-event",
            Event::IndirectAck(_) => "indirect-ack-event",
        }
    }

    /// The sender's common envelope fields.
    pub const fn sender(&self) -> &Sender {
        match self {
            Event::Ping(e) => &e.sender,
            Event::Ack(e) => &e.sender,
            Event::Join(e) => &e.sender,
            Event::Alive(e) => &e.sender,
            Event::Suspect(e) => &e.sender,
            Event::Left(e) => &e.sender,
            Event::Dead(e) => &e.sender,
            Event::Payload(e) => &e.sender,
            Event::AntiEntropy(e) => &e.sender,
            Event::Probe(e) => &e.sender,
            Event::ProbeAck(e) => &e.sender,
            Event::NewClusterSize(e) => &e.sender,
            Event::IndirectPing(e) => &e.sender,
            Event::IndirectAck(e) => &e.sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn cmd_types_match_spec() {
        let sender = Sender {
            id: Uuid::nil(),
            restart_counter: 0,
            tx: 0,
        };
        assert_eq!(
            Event::Ping(Ping {
                sender,
                host: "h".into(),
                port: 1,
                neighbour_id: Uuid::nil(),
                attempt_number: 1
            })
            .cmd_type(),
            0
        );
        assert_eq!(
            Event::IndirectPing(IndirectPing {
                sender,
                host: "h".into(),
                port: 1,
                intermediate_id: Uuid::nil(),
                intermediate_host: "h".into(),
                intermediate_port: 1,
                neighbour_id: Uuid::nil(),
                neighbour_host: "h".into(),
                neighbour_port: 1,
                attempt_number: 1,
            })
            .cmd_type(),
            14
        );
        assert_eq!(
            Event::IndirectAck(IndirectAck {
                sender,
                host: "h".into(),
                port: 1,
                intermediate_id: Uuid::nil(),
                intermediate_host: "h".into(),
                intermediate_port: 1,
                neighbour_id: Uuid::nil(),
                neighbour_host: "h".into(),
                neighbour_port: 1,
                status: NodeStatus::Alive,
            })
            .cmd_type(),
            15
        );
    }
}

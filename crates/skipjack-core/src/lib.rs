//! # skipjack-core
//!
//! The synchronous protocol engine for a skipjack cluster member: a
//! SWIM-family gossip membership and failure-detection protocol.
//!
//! This crate implements:
//! - The neighbour table and node lifecycle (§3, §4.2, §4.3)
//! - The thirteen wire event builders and structural validation (§4.4)
//! - Piggybacked dissemination and the datagram composer (§4.5, §4.6)
//! - The inbound dispatcher and per-event state machine (§4.7, §4.8)
//! - Incarnation freshness predicates (§4.9)
//! - The join protocol and graceful leave (§4.10)
//! - The periodic ping round and failure detector (§4.11)
//!
//! `skipjack-core` never opens a socket and never spawns a task: it is
//! driven entirely by a host (`skipjack-daemon`) that owns a
//! [`transport::Transport`] and calls [`node::Node::receive_datagram`] on
//! arrival and [`node::Node::ping_round_tick`] / [`node::Node::check_timeouts`]
//! on a timer, per the single-threaded actor model of §5.

pub mod builders;
pub mod cluster;
pub mod codec;
pub mod composer;
pub mod dispatcher;
pub mod error;
pub mod freshness;
pub mod join;
pub mod neighbour;
pub mod node;
pub mod outgoing;
pub mod ping_round;
pub mod transport;

pub use cluster::Cluster;
pub use composer::Destination;
pub use error::{CoreError, ProtocolError, Result};
pub use join::calc_n;
pub use neighbour::{Neighbour, NeighbourTable};
pub use node::Node;
pub use transport::Transport;

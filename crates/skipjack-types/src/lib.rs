//! # skipjack-types
//!
//! Shared domain types for the skipjack SWIM-family membership engine.
//! These structures correspond 1:1 with the data model in the protocol
//! specification: node/neighbour identity, status and access codes, the
//! wire event vocabulary, and the process-wide configuration surface.

pub mod config;
pub mod digest;
pub mod event;
pub mod payload;
pub mod status;

pub use config::SkipjackConfig;
pub use digest::NeighbourDigest;
pub use event::Event;
pub use payload::{Payload, PayloadValue};
pub use status::{AccessMode, NodeStatus};

/// A node or neighbour identifier.
pub type NodeId = uuid::Uuid;

/// An incarnation: `(restart_counter, tx)`. Lexicographic `Ord` gives the
/// suitability ordering directly (§4.9).
pub type Incarnation = (u64, u64);

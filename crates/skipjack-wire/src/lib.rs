//! # skipjack-wire
//!
//! The two external collaborators the protocol engine is decoupled from
//! (§1, §6): a compact self-describing binary serializer for nested
//! ordered sequences, maps, primitives, strings and UUIDs, and the
//! encrypted-datagram envelope built on top of it. Neither module knows
//! about events, neighbours or `cmd-type` — that mapping lives in
//! `skipjack-core`'s wire codec (§4.1), which builds [`Value`] trees and
//! hands them here.

pub mod envelope;
pub mod serializer;
pub mod value;

pub use value::Value;

/// Error types for serialization and envelope operations.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The serializer could not encode a value tree.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The serializer could not decode a byte buffer.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// AEAD decryption failed; the caller should drop the datagram
    /// silently and emit a `decrypt-error` tap (§4.7).
    #[error("decrypt error")]
    DecryptError,

    /// The encrypted datagram would exceed the configured maximum UDP
    /// size (§4.6 `udp-packet-too-big`).
    #[error("udp packet too big: {len} bytes exceeds max {max}")]
    PacketTooBig { len: usize, max: usize },

    /// A value tree did not have the shape a UUID decodes from.
    #[error("malformed uuid")]
    MalformedUuid,
}

pub type Result<T> = std::result::Result<T, WireError>;

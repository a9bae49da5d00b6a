//! Protocol error kinds (§7).

/// Errors raised synchronously by builders, setters and the composer.
/// These never reach the network — the caller sees them directly.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid-{kind}")]
    InvalidEvent { kind: &'static str },

    #[error("cluster-size-exceeded")]
    ClusterSizeExceeded,

    #[error("payload-size-too-big")]
    PayloadSizeTooBig { size: usize, max: usize },

    #[error("unknown-neighbour-id")]
    UnknownNeighbourId,

    #[error("unknown-intermediate-node")]
    UnknownIntermediateNode,

    #[error("unknown-neighbour-node")]
    UnknownNeighbourNode,

    /// A received sequence didn't decode to a known event shape: wrong
    /// length, wrong leading tag, or a field of the wrong type (§4.1).
    #[error("malformed-event")]
    MalformedEvent,

    #[error("transport send failed: {0}")]
    TransportSend(String),

    #[error(transparent)]
    Wire(#[from] skipjack_wire::WireError),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while handling an inbound event (§4.8, §7 "Protocol
/// freshness/liveness"). Never returned to a synchronous caller: the
/// dispatcher logs `tap_name()` as an error tap and drops the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("{0}-not-alive-node-error")]
    NotAliveNode(&'static str),
    #[error("{0}-unknown-neighbour-error")]
    UnknownNeighbour(&'static str),
    #[error("{0}-not-alive-neighbour-error")]
    NotAliveNeighbour(&'static str),
    #[error("{0}-bad-restart-counter-error")]
    BadRestartCounter(&'static str),
    #[error("{0}-bad-tx-error")]
    BadTx(&'static str),
    #[error("{0}-neighbour-id-mismatch-error")]
    NeighbourIdMismatch(&'static str),
    #[error("{0}-not-expected-error")]
    NotExpected(&'static str),
    #[error("probe-ack-event-probe-never-send-error")]
    ProbeNeverSent,
    #[error("{0}-cluster-size-exceeded-error")]
    ClusterSizeExceededFor(&'static str),
    #[error("upsert-neighbour-cluster-size-exceeded-error")]
    UpsertNeighbourClusterSizeExceeded,
}

impl ProtocolError {
    /// The exact tap name this error should be logged under (§6
    /// "Error taps end with `-error`").
    pub fn tap_name(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_names_match_spec() {
        assert_eq!(
            ProtocolError::NotAliveNode("ping-event").tap_name(),
            "ping-event-not-alive-node-error"
        );
        assert_eq!(
            ProtocolError::NotExpected("ack-event").tap_name(),
            "ack-event-not-expected-error"
        );
        assert_eq!(
            ProtocolError::BadRestartCounter("anti-entropy-event").tap_name(),
            "anti-entropy-event-bad-restart-counter-error"
        );
        assert_eq!(
            ProtocolError::ClusterSizeExceededFor("join-event").tap_name(),
            "join-event-cluster-size-exceeded-error"
        );
        assert_eq!(
            ProtocolError::UpsertNeighbourClusterSizeExceeded.tap_name(),
            "upsert-neighbour-cluster-size-exceeded-error"
        );
        assert_eq!(
            ProtocolError::ProbeNeverSent.tap_name(),
            "probe-ack-event-probe-never-send-error"
        );
    }
}

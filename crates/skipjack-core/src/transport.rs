//! The UDP transport collaborator (§1, §5 `udp-server-handle`).
//!
//! The core never opens a socket itself — a concrete implementation
//! (`skipjack-daemon`'s `tokio::net::UdpSocket` wrapper) is injected into
//! [`crate::node::Node`] at construction, following the same
//! trait-injection shape the teacher uses for its bootstrap transport.

/// Sends an already-encrypted datagram to a destination. Implementors
/// perform the actual I/O; the core only ever calls `send`.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `datagram` to `host:port`. Returns the number of bytes sent.
    fn send(&self, host: &str, port: u16, datagram: &[u8]) -> Result<usize, Self::Error>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use std::cell::RefCell;

    use super::Transport;

    /// An in-memory transport that records every send, for use in core
    /// tests that don't need real sockets.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: RefCell<Vec<(String, u16, Vec<u8>)>>,
    }

    impl Transport for RecordingTransport {
        type Error = std::convert::Infallible;

        fn send(&self, host: &str, port: u16, datagram: &[u8]) -> Result<usize, Self::Error> {
            self.sent
                .borrow_mut()
                .push((host.to_string(), port, datagram.to_vec()));
            Ok(datagram.len())
        }
    }
}

//! `tokio::net::UdpSocket`-backed [`skipjack_core::Transport`] (§6
//! `udp-server-handle`).

use std::net::SocketAddr;
use std::sync::Arc;

use skipjack_core::Transport;
use tokio::net::UdpSocket;

#[derive(Debug, thiserror::Error)]
pub enum UdpTransportError {
    #[error("could not resolve {host}:{port}")]
    Resolve { host: String, port: u16 },
    #[error("send failed: {0}")]
    Send(#[from] std::io::Error),
}

/// Sends datagrams over a shared, already-bound UDP socket.
///
/// `try_send_to` is synchronous and non-blocking, so this satisfies
/// [`Transport::send`]'s plain function signature without the protocol
/// actor ever awaiting I/O (§5).
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }
}

impl Transport for UdpTransport {
    type Error = UdpTransportError;

    fn send(&self, host: &str, port: u16, datagram: &[u8]) -> Result<usize, Self::Error> {
        let addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|_| UdpTransportError::Resolve {
                    host: host.to_string(),
                    port,
                })?;
        Ok(self.socket.try_send_to(datagram, addr)?)
    }
}

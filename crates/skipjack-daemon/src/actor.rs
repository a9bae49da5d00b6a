//! The single-threaded protocol actor (§5).
//!
//! `Node` is owned exclusively by [`ProtocolActor::run`]; every entry
//! point in §6's canonical list (`join`, `leave`, `probe`, `send-event`,
//! `set-payload`, `set-cluster-size`, `set-status`, getters) is served by
//! mailing a [`Command`] in and awaiting a reply, so nothing outside this
//! task ever touches `Node`'s fields directly.

use std::time::{SystemTime, UNIX_EPOCH};

use skipjack_core::{CoreError, Destination, Node};
use skipjack_types::{Event, NodeStatus, Payload};
use tokio::sync::{mpsc, oneshot};

use crate::transport::UdpTransport;

pub type CoreResult<T> = Result<T, CoreError>;

pub enum Command {
    Join(oneshot::Sender<CoreResult<()>>),
    Leave(oneshot::Sender<CoreResult<()>>),
    Probe {
        host: String,
        port: u16,
        reply: oneshot::Sender<CoreResult<()>>,
    },
    SendEvent {
        dest: Destination,
        event: Event,
        reply: oneshot::Sender<CoreResult<()>>,
    },
    SetPayload(Payload, oneshot::Sender<CoreResult<()>>),
    SetClusterSize(u64, oneshot::Sender<CoreResult<()>>),
    SetStatus(NodeStatus, oneshot::Sender<CoreResult<()>>),
    Status(oneshot::Sender<NodeStatus>),
    NeighbourCount(oneshot::Sender<usize>),
    Inbound(Vec<u8>),
    PingRoundTick,
    TimeoutTick,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub struct ProtocolActor {
    node: Node<UdpTransport>,
    rx: mpsc::Receiver<Command>,
}

impl ProtocolActor {
    pub fn new(node: Node<UdpTransport>, rx: mpsc::Receiver<Command>) -> Self {
        Self { node, rx }
    }

    pub async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            self.handle(cmd);
        }
        tracing::info!("protocol actor stopped: command channel closed");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Join(reply) => {
                let _ = reply.send(self.node.join());
            }
            Command::Leave(reply) => {
                let _ = reply.send(self.node.leave());
            }
            Command::Probe { host, port, reply } => {
                let _ = reply.send(self.node.probe(host, port));
            }
            Command::SendEvent { dest, event, reply } => {
                let _ = reply.send(self.node.send_event(dest, event));
            }
            Command::SetPayload(payload, reply) => {
                let _ = reply.send(self.node.set_payload(payload));
            }
            Command::SetClusterSize(size, reply) => {
                let _ = reply.send(self.node.set_cluster_size(size));
            }
            Command::SetStatus(status, reply) => {
                let _ = reply.send(self.node.set_status(status));
            }
            Command::Status(reply) => {
                let _ = reply.send(self.node.status);
            }
            Command::NeighbourCount(reply) => {
                let _ = reply.send(self.node.neighbours.len());
            }
            Command::Inbound(datagram) => self.node.receive_datagram(&datagram, now_ms()),
            Command::PingRoundTick => {
                if let Err(e) = self.node.ping_round_tick(now_ms()) {
                    tracing::warn!(error = %e, "ping-round-error");
                }
            }
            Command::TimeoutTick => self.node.check_timeouts(now_ms()),
        }
    }
}

/// A cheaply cloneable handle for driving the actor from the socket
/// reader, timer tasks, or an external control surface.
#[derive(Clone)]
pub struct ActorHandle {
    tx: mpsc::Sender<Command>,
}

impl ActorHandle {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    pub async fn join(&self) -> CoreResult<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Join(reply)).await;
        rx.await.unwrap_or(Ok(()))
    }

    pub async fn leave(&self) -> CoreResult<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Leave(reply)).await;
        rx.await.unwrap_or(Ok(()))
    }

    pub async fn probe(&self, host: String, port: u16) -> CoreResult<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Probe { host, port, reply }).await;
        rx.await.unwrap_or(Ok(()))
    }

    pub async fn send_event(&self, dest: Destination, event: Event) -> CoreResult<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self
            .tx
            .send(Command::SendEvent { dest, event, reply })
            .await;
        rx.await.unwrap_or(Ok(()))
    }

    pub async fn set_payload(&self, payload: Payload) -> CoreResult<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::SetPayload(payload, reply)).await;
        rx.await.unwrap_or(Ok(()))
    }

    pub async fn set_cluster_size(&self, size: u64) -> CoreResult<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::SetClusterSize(size, reply)).await;
        rx.await.unwrap_or(Ok(()))
    }

    pub async fn set_status(&self, status: NodeStatus) -> CoreResult<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::SetStatus(status, reply)).await;
        rx.await.unwrap_or(Ok(()))
    }

    pub async fn status(&self) -> Option<NodeStatus> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Status(reply)).await;
        rx.await.ok()
    }

    pub async fn neighbour_count(&self) -> Option<usize> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::NeighbourCount(reply)).await;
        rx.await.ok()
    }

    /// Hand a raw inbound datagram to the actor (called from the UDP
    /// reader task).
    pub async fn inbound(&self, datagram: Vec<u8>) {
        let _ = self.tx.send(Command::Inbound(datagram)).await;
    }

    pub async fn ping_round_tick(&self) {
        let _ = self.tx.send(Command::PingRoundTick).await;
    }

    pub async fn timeout_tick(&self) {
        let _ = self.tx.send(Command::TimeoutTick).await;
    }
}

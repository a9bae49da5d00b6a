//! skipjack-daemon: a single cluster member's protocol-engine process.
//!
//! Single OS process running a Tokio runtime. A UDP socket reader task
//! decodes nothing itself — it just hands raw datagrams to the protocol
//! actor — and two timer tasks drive the ping round and the timeout
//! sweep (§4.11). The actor is the only task that ever touches `Node`
//! (§5).

mod actor;
mod config;
mod transport;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::actor::{ActorHandle, Command, ProtocolActor};
use crate::config::{AdvancedConfig, DaemonConfig};
use crate::transport::UdpTransport;
use skipjack_core::{Cluster, Node};

/// Installs the global `tracing` subscriber from `[advanced]` (§6
/// observability): the directive comes from `log_level`, and output goes
/// to `log_file` when set, otherwise stderr.
fn init_logging(advanced: &AdvancedConfig) -> anyhow::Result<()> {
    let directive = format!("skipjack={}", advanced.log_level).parse()?;
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(directive);
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if advanced.log_file.is_empty() {
        subscriber.init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&advanced.log_file)?;
        subscriber.with_writer(std::sync::Mutex::new(file)).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::load()?;
    init_logging(&config.advanced)?;

    info!("skipjack daemon starting");

    let socket = UdpSocket::bind((config.node.host.as_str(), config.node.port)).await?;
    let local_addr = socket.local_addr()?;
    info!(%local_addr, "bound udp socket");
    let socket = Arc::new(socket);

    let cluster = Cluster::new(
        config.cluster.id,
        config.cluster.name.clone(),
        config.cluster.description.clone(),
        config.cluster.namespace.clone(),
        config.cluster.secret_token.as_bytes(),
        config.cluster.cluster_size,
        config.cluster.tags.iter().cloned().collect::<BTreeSet<_>>(),
    );

    let node = Node::new(
        config.node.id,
        config.node.host.clone(),
        local_addr.port(),
        cluster,
        config.protocol.clone(),
        UdpTransport::new(socket.clone()),
    );

    let (tx, rx) = mpsc::channel(256);
    let handle = ActorHandle::new(tx.clone());
    let actor_task = tokio::spawn(ProtocolActor::new(node, rx).run());

    spawn_datagram_reader(socket.clone(), tx.clone());
    spawn_ping_round_timer(tx.clone(), config.protocol.ping_interval_ms);
    spawn_timeout_sweep_timer(tx.clone(), config.protocol.ack_timeout_ms);

    for seed in &config.cluster.seeds {
        match parse_seed(seed) {
            Some((host, port)) => {
                if let Err(e) = handle.probe(host, port).await {
                    warn!(error = %e, seed, "seed-probe-error");
                }
            }
            None => warn!(seed, "malformed-seed-error"),
        }
    }
    if let Err(e) = handle.join().await {
        error!(error = %e, "join-error");
    }

    tokio::select! {
        _ = actor_task => {}
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, leaving cluster");
            let _ = handle.leave().await;
        }
    }

    info!("skipjack daemon stopped");
    Ok(())
}

fn parse_seed(seed: &str) -> Option<(String, u16)> {
    let (host, port) = seed.rsplit_once(':')?;
    Some((host.to_string(), port.parse().ok()?))
}

fn spawn_datagram_reader(socket: Arc<UdpSocket>, tx: mpsc::Sender<Command>) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 65536];
        loop {
            match socket.recv_from(&mut buf).await {
                Ok((n, _src)) => {
                    let _ = tx.send(Command::Inbound(buf[..n].to_vec())).await;
                }
                Err(e) => warn!(error = %e, "udp-recv-error"),
            }
        }
    });
}

fn spawn_ping_round_timer(tx: mpsc::Sender<Command>, period_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(period_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if tx.send(Command::PingRoundTick).await.is_err() {
                break;
            }
        }
    });
}

/// Sweeps ack/indirect-ack/suspect/dead-retention timeouts (§4.11) on a
/// cadence finer than the ping round itself, so expiry is noticed
/// promptly rather than only once per round.
fn spawn_timeout_sweep_timer(tx: mpsc::Sender<Command>, ack_timeout_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(ack_timeout_ms.max(50) / 2));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if tx.send(Command::TimeoutTick).await.is_err() {
                break;
            }
        }
    });
}

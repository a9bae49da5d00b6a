//! Join protocol, restart lifecycle, and the bootstrap probe (§4.10).

use skipjack_types::{Event, NodeStatus};

use crate::composer::Destination;
use crate::error::Result;
use crate::node::Node;
use crate::transport::Transport;

/// `calc-n`: dissemination fan-out, `floor(log2(cluster-size))` for
/// `cluster-size > 0`, `0` for `cluster-size = 1` (§4.10; §8 test vector:
/// 1->0, 2->1, 4->2, 8->3, ..., 1024->10).
pub fn calc_n(cluster_size: u64) -> u32 {
    63 - cluster_size.max(1).leading_zeros()
}

impl<T: Transport> Node<T> {
    /// Enter the cluster (§4.10). A no-op unless the node is currently
    /// `stop` or `left` — bootstrap seeds are expected to already be in
    /// the neighbour table via prior [`Node::probe`] calls (a `ProbeAck`
    /// from a not-yet-alive node upserts its sender, §4.8).
    ///
    /// Bumps `restart-counter`. With `cluster-size = 1` there is nobody
    /// to join against: all neighbours are dropped and the node goes
    /// straight to `alive`. Otherwise the node moves to `join` and fans a
    /// `Join` event out to up to `calc-n(cluster-size)` currently-known
    /// alive neighbours; the daemon's join-timeout timer drives retries,
    /// and [`Node::confirm_joined`] is called once an `alive` about self
    /// is observed.
    pub fn join(&mut self) -> Result<()> {
        if !matches!(self.status, NodeStatus::Stop | NodeStatus::Left) {
            return Ok(());
        }
        self.restart_counter += 1;

        if self.cluster.cluster_size <= 1 {
            self.neighbours.delete_all();
            // §4.10's size-1 fast path bypasses the join state entirely.
            self.status = NodeStatus::Alive;
            return Ok(());
        }

        self.set_status(NodeStatus::Join)?;

        let fanout = calc_n(self.cluster.cluster_size) as usize;
        let targets: Vec<_> = self
            .neighbours
            .by_status(&[NodeStatus::Alive])
            .iter()
            .map(|n| n.id)
            .take(fanout)
            .collect();
        let join_event = self.build_join()?;
        for id in targets {
            let event = Event::Join(join_event.clone());
            self.send_event(Destination::Neighbour(id), event)?;
        }
        Ok(())
    }

    /// Record that enough of the cluster has acknowledged this node's
    /// membership (`join -> alive`, §4.2, `alive-event-join-confirmed`).
    pub fn confirm_joined(&mut self) -> Result<()> {
        self.set_status(NodeStatus::Alive)
    }

    /// Leave gracefully: announce `Left` to every known neighbour, then
    /// move to `stop` (§4.2 `alive -> left`, `* -> stop`).
    pub fn leave(&mut self) -> Result<()> {
        self.set_status(NodeStatus::Left)?;
        let ids: Vec<_> = self.neighbours.ids().copied().collect();
        for id in ids {
            let event = Event::Left(self.build_left());
            self.send_event(Destination::Neighbour(id), event)?;
        }
        self.set_status(NodeStatus::Stop)
    }

    /// Probe an address that isn't (yet) a known neighbour (§4.10).
    /// Correlated against the eventual `ProbeAck` by `probe_key`; the
    /// dispatcher's `ProbeAck` handler fills in `probe_events[probe_key]`.
    pub fn probe(&mut self, host: impl Into<String>, port: u16) -> Result<()> {
        let host = host.into();
        let probe = self.build_probe(host.clone(), port)?;
        self.probe_events.insert(probe.probe_key, None);
        let event = Event::Probe(probe);
        self.send_event(Destination::address(host, port), event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::neighbour::Neighbour;
    use crate::transport::test_util::RecordingTransport;
    use skipjack_types::{AccessMode, Payload, SkipjackConfig};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn test_node(cluster_size: u64) -> Node<RecordingTransport> {
        let cluster = Cluster::new(Uuid::new_v4(), "c", "", "", b"s", cluster_size, BTreeSet::new());
        Node::new(
            Uuid::new_v4(),
            "127.0.0.1",
            5376,
            cluster,
            SkipjackConfig::default(),
            RecordingTransport::default(),
        )
    }

    fn alive_neighbour(id: Uuid, host: &str) -> Neighbour {
        Neighbour {
            id,
            host: host.into(),
            port: 1,
            status: NodeStatus::Alive,
            access: AccessMode::Direct,
            restart_counter: 0,
            tx: 0,
            payload: Payload::new(),
            updated_at: 0,
        }
    }

    #[test]
    fn calc_n_matches_spec_table() {
        let cases = [
            (1, 0),
            (2, 1),
            (4, 2),
            (8, 3),
            (16, 4),
            (32, 5),
            (64, 6),
            (128, 7),
            (256, 8),
            (512, 9),
            (1024, 10),
        ];
        for (n, expected) in cases {
            assert_eq!(calc_n(n), expected, "calc_n({n})");
        }
    }

    #[test]
    fn singleton_cluster_joins_directly_to_alive() {
        let mut node = test_node(1);
        node.join().unwrap();
        assert_eq!(node.status, NodeStatus::Alive);
        assert_eq!(node.restart_counter, 1);
    }

    #[test]
    fn join_is_a_noop_unless_stop_or_left() {
        let mut node = test_node(1);
        node.join().unwrap();
        assert_eq!(node.restart_counter, 1);
        node.join().unwrap();
        assert_eq!(node.restart_counter, 1, "already alive: second join is a no-op");
    }

    #[test]
    fn multi_node_cluster_fans_join_out_to_known_alive_neighbours() {
        let mut node = test_node(8);
        let id = node.id;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        node.neighbours
            .upsert(id, 8, alive_neighbour(a, "10.0.0.2"), 0)
            .unwrap();
        node.neighbours
            .upsert(id, 8, alive_neighbour(b, "10.0.0.3"), 0)
            .unwrap();

        node.join().unwrap();

        assert_eq!(node.status, NodeStatus::Join);
        assert_eq!(node.transport.sent.borrow().len(), 2);
    }

    #[test]
    fn leave_announces_to_every_neighbour_then_stops() {
        let mut node = test_node(1);
        node.join().unwrap();
        let id = node.id;
        node.neighbours
            .upsert(id, 10, alive_neighbour(Uuid::new_v4(), "10.0.0.5"), 0)
            .unwrap();

        node.leave().unwrap();

        assert_eq!(node.status, NodeStatus::Stop);
        let sent = node.transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "10.0.0.5");
    }
}

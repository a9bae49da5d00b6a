//! Periodic ping round and failure detector (§4.11).
//!
//! Driven by the daemon's timer tasks: `ping_round_tick` on every
//! `ping-interval-ms`, `check_timeouts` on a finer tick that sweeps
//! whatever outstanding pings/indirect pings/suspicions have expired.

use rand::seq::SliceRandom;
use skipjack_types::{Event, NodeId, NodeStatus};

use crate::composer::Destination;
use crate::error::Result;
use crate::node::Node;
use crate::transport::Transport;

impl<T: Transport> Node<T> {
    /// Pop one target off the ping round buffer (refilling it with a
    /// fresh shuffled pass over alive neighbours if empty) and ping it.
    pub fn ping_round_tick(&mut self, now_ms: u64) -> Result<()> {
        if self.ping_round_buffer.is_empty() {
            self.refill_ping_round_buffer();
        }
        let Some(target) = self.ping_round_buffer.pop_front() else {
            return Ok(());
        };
        if !self.neighbours.contains(&target) {
            return Ok(());
        }
        self.send_ping(target, 1, now_ms)
    }

    fn refill_ping_round_buffer(&mut self) {
        let mut ids: Vec<NodeId> = self
            .neighbours
            .by_status(&[NodeStatus::Alive])
            .iter()
            .map(|n| n.id)
            .collect();
        ids.shuffle(&mut rand::thread_rng());
        self.ping_round_buffer = ids.into();
    }

    fn send_ping(&mut self, target: NodeId, attempt_number: u32, now_ms: u64) -> Result<()> {
        let ping = self.build_ping(target, attempt_number)?;
        self.ping_events.insert(target, ping.clone());
        self.ping_sent_at.insert(target, now_ms);
        let ae = self.build_anti_entropy_default();
        // The ping-round path always uses `send_events` (explicit vector)
        // so the outgoing dissemination buffer piggybacks on this
        // datagram (§4.6) — `send_event`/`send_event_ae` deliberately do
        // not drain it.
        self.send_events(
            Destination::Neighbour(target),
            vec![Event::Ping(ping), Event::AntiEntropy(ae)],
        )
    }

    /// Sweep every timeout class (§4.11): an unanswered `Ping` re-pings
    /// or escalates to indirect probing, an unanswered `IndirectPing`
    /// marks the target `suspect`, a `suspect` that outlives
    /// `suspect-timeout-ms` is declared `dead`, and a `dead` neighbour
    /// past `dead-retention-ms` is forgotten entirely.
    pub fn check_timeouts(&mut self, now_ms: u64) {
        self.check_ping_timeouts(now_ms);
        self.check_indirect_ack_timeouts(now_ms);
        self.check_suspect_timeouts(now_ms);
        self.check_dead_retention(now_ms);
    }

    fn check_ping_timeouts(&mut self, now_ms: u64) {
        let overdue: Vec<NodeId> = self
            .ping_sent_at
            .iter()
            .filter(|(_, &sent)| now_ms.saturating_sub(sent) >= self.config.ack_timeout_ms)
            .map(|(id, _)| *id)
            .collect();

        for target in overdue {
            let attempt_number = self
                .ping_events
                .get(&target)
                .map(|p| p.attempt_number)
                .unwrap_or(1);
            self.ping_events.remove(&target);
            self.ping_sent_at.remove(&target);

            if attempt_number < self.config.direct_ping_max_attempts {
                let _ = self.send_ping(target, attempt_number + 1, now_ms);
            } else {
                self.escalate_to_indirect(target, now_ms);
            }
        }
    }

    fn escalate_to_indirect(&mut self, target: NodeId, now_ms: u64) {
        let intermediaries: Vec<NodeId> = self
            .neighbours
            .by_status(&[NodeStatus::Alive])
            .iter()
            .filter(|n| n.id != target)
            .map(|n| n.id)
            .take(self.config.indirect_ping_fanout)
            .collect();

        if intermediaries.is_empty() {
            // No one left to ask: go straight to suspicion.
            self.mark_suspect(target, now_ms);
            return;
        }

        let mut sent_any = false;
        for intermediate in intermediaries {
            if let Ok(indirect_ping) = self.build_indirect_ping(intermediate, target, 1) {
                if self
                    .send_event(
                        Destination::Neighbour(intermediate),
                        Event::IndirectPing(indirect_ping.clone()),
                    )
                    .is_ok()
                {
                    self.indirect_ping_events.insert(target, indirect_ping);
                    self.indirect_ping_sent_at.insert(target, now_ms);
                    sent_any = true;
                }
            }
        }
        if !sent_any {
            self.mark_suspect(target, now_ms);
        }
    }

    fn check_indirect_ack_timeouts(&mut self, now_ms: u64) {
        let overdue: Vec<NodeId> = self
            .indirect_ping_sent_at
            .iter()
            .filter(|(_, &sent)| {
                now_ms.saturating_sub(sent) >= self.config.indirect_ack_timeout_ms
            })
            .map(|(id, _)| *id)
            .collect();

        for target in overdue {
            self.indirect_ping_events.remove(&target);
            self.indirect_ping_sent_at.remove(&target);
            self.mark_suspect(target, now_ms);
        }
    }

    fn mark_suspect(&mut self, target: NodeId, now_ms: u64) {
        let Some(n) = self.neighbours.get(&target) else {
            return;
        };
        if n.status != NodeStatus::Alive {
            return;
        }
        let (rc, tx) = (n.restart_counter, n.tx);
        self.neighbours.set_status(&target, NodeStatus::Suspect);
        if let Some(n) = self.neighbours.get_mut(&target) {
            n.updated_at = now_ms;
        }
        if let Ok(suspect) = self.build_suspect(target, rc, tx) {
            self.disseminate(Event::Suspect(suspect));
        }
    }

    fn check_suspect_timeouts(&mut self, now_ms: u64) {
        let overdue: Vec<(NodeId, u64, u64)> = self
            .neighbours
            .by_status(&[NodeStatus::Suspect])
            .iter()
            .filter(|n| now_ms.saturating_sub(n.updated_at) >= self.config.suspect_timeout_ms)
            .map(|n| (n.id, n.restart_counter, n.tx))
            .collect();

        for (id, rc, tx) in overdue {
            self.neighbours.set_status(&id, NodeStatus::Dead);
            if let Some(n) = self.neighbours.get_mut(&id) {
                n.updated_at = now_ms;
            }
            if let Ok(dead) = self.build_dead(id, rc, tx) {
                self.disseminate(Event::Dead(dead));
            }
        }
    }

    fn check_dead_retention(&mut self, now_ms: u64) {
        let expired: Vec<NodeId> = self
            .neighbours
            .by_status(&[NodeStatus::Dead])
            .iter()
            .filter(|n| now_ms.saturating_sub(n.updated_at) >= self.config.dead_retention_ms)
            .map(|n| n.id)
            .collect();

        for id in expired {
            self.neighbours.delete(&id);
            self.ping_events.remove(&id);
            self.ping_sent_at.remove(&id);
            self.indirect_ping_events.remove(&id);
            self.indirect_ping_sent_at.remove(&id);
        }
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
        let mut config = SkipjackConfig::default();
        config.ack_timeout_ms = 100;
        config.indirect_ack_timeout_ms = 100;
        config.suspect_timeout_ms = 100;
        config.dead_retention_ms = 100;
        config.direct_ping_max_attempts = 1;
        Node::new(
            Uuid::new_v4(),
            "127.0.0.1",
            5376,
            cluster,
            config,
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
    fn ping_round_tick_sends_a_ping_to_a_neighbour() {
        let mut node = test_node(10);
        let id = node.id;
        let a = Uuid::new_v4();
        node.neighbours
            .upsert(id, 10, alive_neighbour(a, "10.0.0.2"), 0)
            .unwrap();

        node.ping_round_tick(0).unwrap();

        assert_eq!(node.transport.sent.borrow().len(), 1);
        assert!(node.ping_sent_at.contains_key(&a));
    }

    #[test]
    fn unanswered_ping_escalates_to_indirect_when_attempts_exhausted() {
        let mut node = test_node(10);
        let id = node.id;
        let target = Uuid::new_v4();
        let intermediate = Uuid::new_v4();
        node.neighbours
            .upsert(id, 10, alive_neighbour(target, "10.0.0.2"), 0)
            .unwrap();
        node.neighbours
            .upsert(id, 10, alive_neighbour(intermediate, "10.0.0.3"), 0)
            .unwrap();

        node.send_ping(target, 1, 0).unwrap();
        node.check_timeouts(200);

        assert!(node.indirect_ping_events.contains_key(&target));
        assert!(!node.ping_events.contains_key(&target));
    }

    #[test]
    fn suspect_past_timeout_becomes_dead() {
        let mut node = test_node(10);
        let id = node.id;
        let target = Uuid::new_v4();
        let mut n = alive_neighbour(target, "10.0.0.2");
        n.status = NodeStatus::Suspect;
        n.updated_at = 0;
        node.neighbours.upsert(id, 10, n, 0).unwrap();

        node.check_timeouts(500);

        assert_eq!(node.neighbours.get(&target).unwrap().status, NodeStatus::Dead);
    }

    #[test]
    fn dead_past_retention_is_forgotten() {
        let mut node = test_node(10);
        let id = node.id;
        let target = Uuid::new_v4();
        let mut n = alive_neighbour(target, "10.0.0.2");
        n.status = NodeStatus::Dead;
        n.updated_at = 0;
        node.neighbours.upsert(id, 10, n, 0).unwrap();

        node.check_timeouts(500);

        assert!(node.neighbours.get(&target).is_none());
    }
}

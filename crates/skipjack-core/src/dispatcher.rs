//! Inbound dispatcher and the per-event protocol state machine (§4.7, §4.8).
//!
//! Decryption/deserialization failures are dropped silently with a tap;
//! a malformed individual event tuple is dropped the same way without
//! aborting the rest of the batch. Protocol-level rejections (stale
//! incarnation, unknown sender, ...) are never returned to a caller —
//! they are logged as `tracing` taps and the offending event is dropped,
//! per §7's "protocol errors are recovered locally".

use skipjack_types::event::{Ack, Alive, AntiEntropy, Dead, IndirectAck, IndirectPing, Join, Ping, ProbeAck, Suspect};
use skipjack_types::{Event, NodeId, NodeStatus};

use crate::composer::Destination;
use crate::error::ProtocolError;
use crate::neighbour::Neighbour;
use crate::node::Node;
use crate::transport::Transport;

impl<T: Transport> Node<T> {
    /// Decrypt and dispatch a raw inbound datagram (§4.7). Never returns
    /// an error to the caller — every failure mode is a dropped datagram
    /// plus a tap.
    pub fn receive_datagram(&mut self, datagram: &[u8], now_ms: u64) {
        let value = match skipjack_wire::envelope::decode(datagram, self.cluster.secret_key()) {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(node_id = %self.id, "decrypt-error");
                return;
            }
        };
        let items = match value.as_array() {
            Some(items) => items.clone(),
            None => {
                tracing::warn!(node_id = %self.id, "malformed-event");
                return;
            }
        };
        for item in items {
            match crate::codec::restore(&item) {
                Ok(event) => self.dispatch(event, now_ms),
                Err(_) => tracing::warn!(node_id = %self.id, "malformed-event"),
            }
        }
    }

    /// Dispatch a single already-decoded event (§4.8).
    pub fn dispatch(&mut self, event: Event, now_ms: u64) {
        let name = event.tap_name();
        let result = match &event {
            Event::Probe(_) | Event::ProbeAck(_) | Event::Join(_) => Ok(()),
            _ => self.check_common_preconditions(&event, now_ms),
        };
        let result = result.and_then(|()| self.apply_event(event, now_ms));

        match result {
            Ok(()) => tracing::info!(node_id = %self.id, event = name, "handled"),
            Err(e) => tracing::warn!(node_id = %self.id, event = name, tap = %e.tap_name(), "rejected"),
        }
    }

    /// Preconditions shared by every non-bootstrap event (§4.8): local
    /// node alive-ish, sender known, sender's record alive-ish, sender's
    /// incarnation fresh.
    fn check_common_preconditions(
        &mut self,
        event: &Event,
        _now_ms: u64,
    ) -> Result<(), ProtocolError> {
        let name = event.tap_name();
        if !self.is_alive_ish() {
            return Err(ProtocolError::NotAliveNode(name));
        }
        let sender = event.sender();
        let sender_neighbour = self
            .neighbours
            .get(&sender.id)
            .ok_or(ProtocolError::UnknownNeighbour(name))?;
        if !sender_neighbour.is_alive_ish() {
            let dead = self
                .build_dead(sender.id, sender.restart_counter, sender.tx)
                .map_err(|_| ProtocolError::NotAliveNeighbour(name))?;
            let _ = self.send_event(Destination::Neighbour(sender.id), Event::Dead(dead));
            return Err(ProtocolError::NotAliveNeighbour(name));
        }
        let local = (sender_neighbour.restart_counter, sender_neighbour.tx);
        if !crate::freshness::suitable_restart_counter(sender.restart_counter, local.0) {
            return Err(ProtocolError::BadRestartCounter(name));
        }
        if !crate::freshness::suitable_tx(sender.restart_counter, local.0, sender.tx, local.1) {
            return Err(ProtocolError::BadTx(name));
        }
        Ok(())
    }

    fn apply_event(&mut self, event: Event, now_ms: u64) -> Result<(), ProtocolError> {
        match event {
            Event::Probe(e) => {
                let ack = self
                    .build_probe_ack(self.status, e.sender.id, e.sender.tx, e.probe_key)
                    .map_err(|_| ProtocolError::NotExpected("probe-event"))?;
                let _ = self.send_event(
                    Destination::address(e.host.clone(), e.port),
                    Event::ProbeAck(ack),
                );
                Ok(())
            }
            Event::ProbeAck(e) => self.handle_probe_ack(e, now_ms),
            Event::Ping(e) => self.handle_ping(e, now_ms),
            Event::Ack(e) => self.handle_ack(e, now_ms),
            Event::IndirectPing(e) => self.handle_indirect_ping(e),
            Event::IndirectAck(e) => self.handle_indirect_ack(e, now_ms),
            Event::Join(e) => self.handle_join(e, now_ms),
            Event::Alive(e) => self.handle_alive(e, now_ms),
            Event::Suspect(e) => self.handle_suspect(e, now_ms),
            Event::Dead(e) => self.handle_dead(e, now_ms),
            Event::AntiEntropy(e) => self.handle_anti_entropy(e, now_ms),
            Event::NewClusterSize(e) => {
                self.cluster.cluster_size = e.new_cluster_size;
                self.disseminate(Event::NewClusterSize(e));
                Ok(())
            }
            Event::Payload(e) => {
                self.disseminate(Event::Payload(e));
                Ok(())
            }
            Event::Left(e) => {
                self.neighbours.set_status(&e.sender.id, NodeStatus::Left);
                self.disseminate(Event::Left(e));
                Ok(())
            }
        }
    }

    fn handle_probe_ack(&mut self, e: ProbeAck, now_ms: u64) -> Result<(), ProtocolError> {
        if !self.probe_events.contains_key(&e.probe_key) {
            return Err(ProtocolError::ProbeNeverSent);
        }
        let status = e.status;
        let sender_id = e.sender.id;
        let sender_restart_counter = e.sender.restart_counter;
        let sender_tx = e.sender.tx;
        let host = e.host.clone();
        let port = e.port;
        self.probe_events.insert(e.probe_key, Some(e));

        if !self.is_alive_ish() {
            let neighbour = Neighbour {
                id: sender_id,
                host,
                port,
                status,
                access: skipjack_types::AccessMode::Direct,
                restart_counter: sender_restart_counter,
                tx: sender_tx,
                payload: skipjack_types::Payload::new(),
                updated_at: now_ms,
            };
            self.neighbours
                .upsert(self.id, self.cluster.cluster_size, neighbour, now_ms)
                .map_err(|_| ProtocolError::UpsertNeighbourClusterSizeExceeded)?;
        }
        Ok(())
    }

    fn handle_ping(&mut self, e: Ping, now_ms: u64) -> Result<(), ProtocolError> {
        if e.neighbour_id != self.id {
            return Err(ProtocolError::NeighbourIdMismatch("ping-event"));
        }
        let sender_id = e.sender.id;
        let sender_tx = e.sender.tx;
        let ack = self
            .build_ack(sender_id, sender_tx)
            .map_err(|_| ProtocolError::NeighbourIdMismatch("ping-event"))?;
        let _ = self.send_event(Destination::Neighbour(sender_id), Event::Ack(ack));

        self.neighbours.set_tx(&sender_id, sender_tx);
        self.revive_if_suspect(sender_id, now_ms);
        Ok(())
    }

    fn handle_ack(&mut self, e: Ack, now_ms: u64) -> Result<(), ProtocolError> {
        if self.ping_events.remove(&e.sender.id).is_none() {
            return Err(ProtocolError::NotExpected("ack-event"));
        }
        self.ping_sent_at.remove(&e.sender.id);
        self.neighbours.set_tx(&e.sender.id, e.sender.tx);
        self.revive_if_suspect(e.sender.id, now_ms);
        Ok(())
    }

    /// Re-disseminates an `Alive` about a neighbour that just proved
    /// itself reachable (§4.8 Ping/Ack "if sender was suspect ... enqueue
    /// an Alive event").
    fn revive_if_suspect(&mut self, id: NodeId, _now_ms: u64) {
        let Some(n) = self.neighbours.get(&id) else {
            return;
        };
        if n.status != NodeStatus::Suspect {
            return;
        }
        let (rc, tx) = (n.restart_counter, n.tx);
        self.neighbours.set_status(&id, NodeStatus::Alive);
        if let Ok(alive) = self.build_alive(id, rc, tx) {
            self.disseminate(Event::Alive(alive));
        }
    }

    fn handle_indirect_ping(&mut self, e: IndirectPing) -> Result<(), ProtocolError> {
        if self.id == e.intermediate_id {
            let _ = self.send_event(
                Destination::address(e.neighbour_host.clone(), e.neighbour_port),
                Event::IndirectPing(e),
            );
            Ok(())
        } else if self.id == e.neighbour_id {
            let ack = self
                .build_indirect_ack(
                    e.intermediate_id,
                    e.intermediate_host.clone(),
                    e.intermediate_port,
                    e.neighbour_id,
                    e.neighbour_host.clone(),
                    e.neighbour_port,
                    self.status,
                )
                .map_err(|_| ProtocolError::NeighbourIdMismatch("indirect-ping-event"))?;
            let _ = self.send_event(
                Destination::address(e.intermediate_host.clone(), e.intermediate_port),
                Event::IndirectAck(ack),
            );
            Ok(())
        } else {
            Err(ProtocolError::NeighbourIdMismatch("indirect-ping-event"))
        }
    }

    fn handle_indirect_ack(&mut self, e: IndirectAck, now_ms: u64) -> Result<(), ProtocolError> {
        if self.id == e.intermediate_id {
            let _ = self.send_event(
                Destination::address(e.host.clone(), e.port),
                Event::IndirectAck(e),
            );
            return Ok(());
        }
        if self.indirect_ping_events.remove(&e.neighbour_id).is_none() {
            return Err(ProtocolError::NotExpected("indirect-ack-event"));
        }
        self.indirect_ping_sent_at.remove(&e.neighbour_id);
        self.neighbours.set_tx(&e.neighbour_id, e.sender.tx);
        self.neighbours.set_nb_indirect_access(&e.neighbour_id);
        self.neighbours.set_status(&e.neighbour_id, e.status);
        if let Some(n) = self.neighbours.get(&e.neighbour_id) {
            let (id, rc, tx) = (n.id, n.restart_counter, n.tx);
            if let Ok(alive) = self.build_alive(id, rc, tx) {
                self.disseminate(Event::Alive(alive));
            }
        }
        let _ = now_ms;
        Ok(())
    }

    fn handle_join(&mut self, e: Join, now_ms: u64) -> Result<(), ProtocolError> {
        let name = "join-event";
        let existing = self.neighbours.get(&e.sender.id);
        let local = existing.map(|n| (n.restart_counter, n.tx)).unwrap_or((0, 0));

        if !crate::freshness::suitable_restart_counter(e.sender.restart_counter, local.0) {
            if let Ok(dead) = self.build_dead(e.sender.id, e.sender.restart_counter, e.sender.tx) {
                let _ = self.send_event(Destination::address(e.host.clone(), e.port), Event::Dead(dead));
            }
            return Err(ProtocolError::BadRestartCounter(name));
        }
        if existing.is_some()
            && !crate::freshness::suitable_tx(e.sender.restart_counter, local.0, e.sender.tx, local.1)
        {
            return Err(ProtocolError::BadTx(name));
        }

        let neighbour = Neighbour {
            id: e.sender.id,
            host: e.host.clone(),
            port: e.port,
            status: NodeStatus::Alive,
            access: skipjack_types::AccessMode::Direct,
            restart_counter: e.sender.restart_counter,
            tx: e.sender.tx,
            payload: skipjack_types::Payload::new(),
            updated_at: now_ms,
        };
        if self
            .neighbours
            .upsert(self.id, self.cluster.cluster_size, neighbour, now_ms)
            .is_err()
        {
            if let Ok(dead) = self.build_dead(e.sender.id, e.sender.restart_counter, e.sender.tx) {
                let _ = self.send_event(Destination::address(e.host.clone(), e.port), Event::Dead(dead));
            }
            return Err(ProtocolError::ClusterSizeExceededFor(name));
        }

        let alive = self
            .build_alive(e.sender.id, e.sender.restart_counter, e.sender.tx)
            .map_err(|_| ProtocolError::ClusterSizeExceededFor(name))?;
        self.disseminate(Event::Alive(alive.clone()));
        let _ = self.send_event_ae(
            Destination::address(e.host, e.port),
            Event::Alive(alive),
        );
        Ok(())
    }

    fn handle_alive(&mut self, e: Alive, now_ms: u64) -> Result<(), ProtocolError> {
        let name = "alive-event";
        if e.neighbour_id == self.id {
            if self.status == NodeStatus::Join {
                let _ = self.confirm_joined();
                tracing::info!(node_id = %self.id, "alive-event-join-confirmed");
            }
            return Ok(());
        }
        let local = self
            .neighbours
            .get(&e.neighbour_id)
            .map(|n| (n.restart_counter, n.tx));
        if !crate::freshness::suitable_incarnation_opt(
            local,
            (e.neighbour_restart_counter, e.neighbour_tx),
        ) && local.is_some()
        {
            return Err(ProtocolError::BadTx(name));
        }

        match self.neighbours.get_mut(&e.neighbour_id) {
            Some(existing) => {
                existing.status = NodeStatus::Alive;
                existing.restart_counter = existing.restart_counter.max(e.neighbour_restart_counter);
                existing.tx = existing.tx.max(e.neighbour_tx);
                existing.updated_at = now_ms;
            }
            None => {
                let neighbour = Neighbour {
                    id: e.neighbour_id,
                    host: String::new(),
                    port: 0,
                    status: NodeStatus::Alive,
                    access: skipjack_types::AccessMode::Indirect,
                    restart_counter: e.neighbour_restart_counter,
                    tx: e.neighbour_tx,
                    payload: skipjack_types::Payload::new(),
                    updated_at: now_ms,
                };
                let _ = self
                    .neighbours
                    .upsert(self.id, self.cluster.cluster_size, neighbour, now_ms);
            }
        }
        self.disseminate(Event::Alive(e));
        Ok(())
    }

    fn handle_suspect(&mut self, e: Suspect, now_ms: u64) -> Result<(), ProtocolError> {
        self.neighbours.set_status(&e.neighbour_id, NodeStatus::Suspect);
        if let Some(n) = self.neighbours.get_mut(&e.neighbour_id) {
            n.updated_at = now_ms;
        }
        self.disseminate(Event::Suspect(e));
        Ok(())
    }

    fn handle_dead(&mut self, e: Dead, now_ms: u64) -> Result<(), ProtocolError> {
        self.neighbours.set_status(&e.neighbour_id, NodeStatus::Dead);
        if let Some(n) = self.neighbours.get_mut(&e.neighbour_id) {
            n.updated_at = now_ms;
        }
        self.disseminate(Event::Dead(e));
        Ok(())
    }

    fn handle_anti_entropy(&mut self, e: AntiEntropy, now_ms: u64) -> Result<(), ProtocolError> {
        for digest in e.anti_entropy_data {
            if digest.id == self.id {
                continue;
            }
            let local = self.neighbours.get(&digest.id).map(|n| n.incarnation());
            let candidate = (digest.restart_counter, digest.tx);
            let fresher = match local {
                None => true,
                Some(_) => crate::freshness::suitable_incarnation_opt(local, candidate),
            };
            if !fresher {
                continue;
            }
            let neighbour = Neighbour {
                id: digest.id,
                host: digest.host,
                port: digest.port,
                status: digest.status,
                access: digest.access,
                restart_counter: digest.restart_counter,
                tx: digest.tx,
                payload: digest.payload,
                updated_at: now_ms,
            };
            let _ = self
                .neighbours
                .upsert(self.id, self.cluster.cluster_size, neighbour, now_ms);
        }
        Ok(())
    }
}

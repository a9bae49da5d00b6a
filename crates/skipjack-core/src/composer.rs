//! The datagram composer (§4.6).
//!
//! Turns a handful of events into a single encrypted datagram, piggybacking
//! as much of the outgoing dissemination buffer as fits under
//! `max-udp-size`, and hands the result to the injected [`Transport`].

use skipjack_types::{Event, NodeId};

use crate::codec;
use crate::error::{CoreError, Result};
use crate::node::Node;
use crate::transport::Transport;

/// Where a datagram is headed: an explicit address, or a known neighbour
/// resolved through the neighbour table.
pub enum Destination {
    Address { host: String, port: u16 },
    Neighbour(NodeId),
}

impl Destination {
    pub fn address(host: impl Into<String>, port: u16) -> Self {
        Destination::Address {
            host: host.into(),
            port,
        }
    }
}

impl<T: Transport> Node<T> {
    fn resolve(&self, dest: &Destination) -> Result<(String, u16)> {
        match dest {
            Destination::Address { host, port } => Ok((host.clone(), *port)),
            Destination::Neighbour(id) => {
                let n = self
                    .neighbours
                    .get(id)
                    .ok_or(CoreError::UnknownNeighbourId)?;
                Ok((n.host.clone(), n.port))
            }
        }
    }

    fn encode_datagram(&self, events: &[Event], max_size: Option<usize>) -> Result<Vec<u8>> {
        let value = skipjack_wire::Value::Array(events.iter().map(codec::prepare).collect());
        Ok(skipjack_wire::envelope::encode(
            &value,
            self.cluster.secret_key(),
            max_size,
        )?)
    }

    /// Send a single event. Does NOT touch the outgoing buffer (§4.6:
    /// "the outgoing buffer is NOT consumed by these").
    pub fn send_event(&mut self, dest: Destination, event: Event) -> Result<()> {
        self.send_bare(dest, vec![event], true)
    }

    /// Send a single event bypassing the `max-udp-size` refusal (§4.6's
    /// override flag). Still does not touch the outgoing buffer.
    pub fn send_event_unchecked(&mut self, dest: Destination, event: Event) -> Result<()> {
        self.send_bare(dest, vec![event], false)
    }

    /// Send an event alongside a freshly sampled anti-entropy digest
    /// (§4.6 "piggybacks membership state on every outbound datagram").
    /// Does NOT touch the outgoing buffer.
    pub fn send_event_ae(&mut self, dest: Destination, event: Event) -> Result<()> {
        let ae = self.build_anti_entropy_default();
        self.send_bare(dest, vec![event, Event::AntiEntropy(ae)], true)
    }

    fn send_bare(&mut self, dest: Destination, events: Vec<Event>, enforce_max_size: bool) -> Result<()> {
        let (host, port) = self.resolve(&dest)?;
        let max_size = enforce_max_size.then_some(self.config.max_udp_size);
        let datagram = self.encode_datagram(&events, max_size)?;
        self.transport
            .send(&host, port, &datagram)
            .map_err(|e| CoreError::TransportSend(e.to_string()))?;
        Ok(())
    }

    /// Send an explicit batch of events, draining as many buffered
    /// outgoing events as fit under `max-udp-size`. This is the only
    /// wrapper that consumes the outgoing buffer (§4.6) — the ping-round
    /// path always calls this, after appending anti-entropy to `events`.
    /// If the full batch overflows the datagram, the piggyback is
    /// dropped and only the requested events are sent — the dropped
    /// events remain on the buffer for next time.
    pub fn send_events(&mut self, dest: Destination, events: Vec<Event>) -> Result<()> {
        self.send_events_inner(dest, events, true)
    }

    /// As [`Node::send_events`], but bypasses the `max-udp-size` refusal
    /// (§4.6's override flag).
    pub fn send_events_unchecked(&mut self, dest: Destination, events: Vec<Event>) -> Result<()> {
        self.send_events_inner(dest, events, false)
    }

    fn send_events_inner(
        &mut self,
        dest: Destination,
        events: Vec<Event>,
        enforce_max_size: bool,
    ) -> Result<()> {
        let (host, port) = self.resolve(&dest)?;
        let max_size = enforce_max_size.then_some(self.config.max_udp_size);

        let piggyback = self.outgoing.take_events(self.outgoing.len());
        let mut batch = events.clone();
        batch.extend(piggyback.iter().cloned());

        let datagram = match self.encode_datagram(&batch, max_size) {
            Ok(d) => d,
            Err(_) if !piggyback.is_empty() => {
                // Oversized with piggyback: put it back and retry bare.
                self.outgoing.set_outgoing_events(piggyback);
                self.encode_datagram(&events, max_size)?
            }
            Err(e) => return Err(e),
        };

        self.transport
            .send(&host, port, &datagram)
            .map_err(|e| CoreError::TransportSend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::transport::test_util::RecordingTransport;
    use skipjack_types::event::{Left, Sender};
    use skipjack_types::SkipjackConfig;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn test_node() -> Node<RecordingTransport> {
        let cluster = Cluster::new(Uuid::new_v4(), "c", "", "", b"s", 10, BTreeSet::new());
        Node::new(
            Uuid::new_v4(),
            "127.0.0.1",
            5376,
            cluster,
            SkipjackConfig::default(),
            RecordingTransport::default(),
        )
    }

    fn left_event(node: &Node<RecordingTransport>) -> Event {
        Event::Left(Left {
            sender: Sender {
                id: node.id,
                restart_counter: node.restart_counter,
                tx: node.tx,
            },
        })
    }

    #[test]
    fn send_event_resolves_explicit_address() {
        let mut node = test_node();
        let event = left_event(&node);
        node.send_event(Destination::address("10.0.0.2", 5376), event)
            .unwrap();
        let sent = node.transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "10.0.0.2");
        assert_eq!(sent[0].1, 5376);
    }

    #[test]
    fn send_event_to_unknown_neighbour_fails() {
        let mut node = test_node();
        let event = left_event(&node);
        assert!(matches!(
            node.send_event(Destination::Neighbour(Uuid::new_v4()), event),
            Err(CoreError::UnknownNeighbourId)
        ));
    }

    #[test]
    fn send_event_does_not_drain_outgoing_buffer() {
        let mut node = test_node();
        let piggyback = left_event(&node);
        node.disseminate(piggyback);
        assert_eq!(node.outgoing.len(), 1);
        let event = left_event(&node);
        node.send_event(Destination::address("10.0.0.2", 5376), event)
            .unwrap();
        assert_eq!(node.outgoing.len(), 1);
    }

    #[test]
    fn send_events_drains_outgoing_buffer() {
        let mut node = test_node();
        let piggyback = left_event(&node);
        node.disseminate(piggyback);
        assert_eq!(node.outgoing.len(), 1);
        let event = left_event(&node);
        node.send_events(Destination::address("10.0.0.2", 5376), vec![event])
            .unwrap();
        assert!(node.outgoing.is_empty());
    }
}

//! The outgoing-event piggyback buffer (§4.5).

use std::collections::VecDeque;

use skipjack_types::Event;

/// FIFO queue of events waiting to be piggybacked on the next outbound
/// datagram. Drained by the datagram composer (§4.6).
#[derive(Debug, Default)]
pub struct OutgoingBuffer {
    events: VecDeque<Event>,
}

impl OutgoingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove and return the first `n` events (or all, if fewer remain).
    pub fn take_events(&mut self, n: usize) -> Vec<Event> {
        let n = n.min(self.events.len());
        self.events.drain(..n).collect()
    }

    /// Replace the buffer wholesale.
    pub fn set_outgoing_events(&mut self, events: Vec<Event>) {
        self.events = events.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skipjack_types::event::{Left, Sender};
    use uuid::Uuid;

    fn event() -> Event {
        Event::Left(Left {
            sender: Sender {
                id: Uuid::new_v4(),
                restart_counter: 0,
                tx: 0,
            },
        })
    }

    #[test]
    fn fifo_order_preserved() {
        let mut buf = OutgoingBuffer::new();
        let a = event();
        let b = event();
        buf.put_event(a.clone());
        buf.put_event(b.clone());
        assert_eq!(buf.take_events(1), vec![a]);
        assert_eq!(buf.take_events(10), vec![b]);
    }

    #[test]
    fn take_more_than_available_returns_all() {
        let mut buf = OutgoingBuffer::new();
        buf.put_event(event());
        let taken = buf.take_events(5);
        assert_eq!(taken.len(), 1);
        assert!(buf.is_empty());
    }

    #[test]
    fn set_outgoing_events_replaces_buffer() {
        let mut buf = OutgoingBuffer::new();
        buf.put_event(event());
        buf.set_outgoing_events(vec![event(), event()]);
        assert_eq!(buf.len(), 2);
    }
}

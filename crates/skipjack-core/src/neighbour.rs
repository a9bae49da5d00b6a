//! Neighbour records and the neighbour table (§3 Neighbour, §4.3).

use std::collections::HashMap;

use skipjack_types::{AccessMode, NodeId, NodeStatus, Payload};

use crate::error::{CoreError, Result};

/// A locally held view of a peer (§3).
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbour {
    pub id: NodeId,
    pub host: String,
    pub port: u16,
    pub status: NodeStatus,
    pub access: AccessMode,
    pub restart_counter: u64,
    pub tx: u64,
    pub payload: Payload,
    pub updated_at: u64,
}

impl Neighbour {
    pub fn incarnation(&self) -> (u64, u64) {
        (self.restart_counter, self.tx)
    }

    pub fn is_alive_ish(&self) -> bool {
        self.status.is_alive_ish()
    }
}

/// The node's indexed set of peers (§4.3). Owned exclusively by the
/// protocol actor (§5) — no internal locking.
#[derive(Debug, Default)]
pub struct NeighbourTable {
    by_id: HashMap<NodeId, Neighbour>,
}

impl NeighbourTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Neighbour> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Neighbour> {
        self.by_id.get_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Insert or refresh a neighbour record (§4.3).
    ///
    /// Rejects `self_id`. Rejects growing past `cluster_size` (counting
    /// the local node itself) with [`CoreError::ClusterSizeExceeded`].
    /// When the id already exists, replaces the record but never lowers
    /// the stored `(restart_counter, tx)` pair; `updated_at` is always
    /// refreshed.
    pub fn upsert(
        &mut self,
        self_id: NodeId,
        cluster_size: u64,
        mut incoming: Neighbour,
        now_ms: u64,
    ) -> Result<()> {
        if incoming.id == self_id {
            return Err(CoreError::InvalidEvent {
                kind: "self-as-neighbour",
            });
        }

        match self.by_id.get_mut(&incoming.id) {
            Some(existing) => {
                if incoming.restart_counter <= existing.restart_counter {
                    incoming.restart_counter = existing.restart_counter;
                }
                if incoming.tx <= existing.tx {
                    incoming.tx = existing.tx;
                }
                incoming.updated_at = now_ms;
                *existing = incoming;
            }
            None => {
                // |neighbours| + 1 <= cluster_size after insertion.
                if (self.by_id.len() as u64) + 2 > cluster_size {
                    return Err(CoreError::ClusterSizeExceeded);
                }
                incoming.updated_at = now_ms;
                self.by_id.insert(incoming.id, incoming);
            }
        }
        Ok(())
    }

    pub fn delete(&mut self, id: &NodeId) -> Option<Neighbour> {
        self.by_id.remove(id)
    }

    /// Remove every neighbour, returning the count removed.
    pub fn delete_all(&mut self) -> usize {
        let n = self.by_id.len();
        self.by_id.clear();
        n
    }

    pub fn by_status(&self, statuses: &[NodeStatus]) -> Vec<&Neighbour> {
        self.by_id
            .values()
            .filter(|n| statuses.contains(&n.status))
            .collect()
    }

    /// The least-recently-updated neighbour, optionally restricted to a
    /// status set. Used to pick escalation victims and for liveness
    /// heuristics (§4.3).
    pub fn oldest(&self, statuses: Option<&[NodeStatus]>) -> Option<&Neighbour> {
        self.by_id
            .values()
            .filter(|n| statuses.map_or(true, |s| s.contains(&n.status)))
            .min_by_key(|n| n.updated_at)
    }

    pub fn count_by_status(&self, statuses: &[NodeStatus]) -> usize {
        self.by_id
            .values()
            .filter(|n| statuses.contains(&n.status))
            .count()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.by_id.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbour> {
        self.by_id.values()
    }

    pub fn set_status(&mut self, id: &NodeId, status: NodeStatus) -> bool {
        match self.by_id.get_mut(id) {
            Some(n) => {
                n.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_access(&mut self, id: &NodeId, access: AccessMode) -> bool {
        match self.by_id.get_mut(id) {
            Some(n) => {
                n.access = access;
                true
            }
            None => false,
        }
    }

    pub fn set_nb_direct_access(&mut self, id: &NodeId) -> bool {
        self.set_access(id, AccessMode::Direct)
    }

    pub fn set_nb_indirect_access(&mut self, id: &NodeId) -> bool {
        self.set_access(id, AccessMode::Indirect)
    }

    /// `set-nb-tx`: no-op if `tx <= current`.
    pub fn set_tx(&mut self, id: &NodeId, tx: u64) {
        if let Some(n) = self.by_id.get_mut(id) {
            if tx > n.tx {
                n.tx = tx;
            }
        }
    }

    /// `set-nb-restart-counter`: no-op if `restart_counter <= current`.
    pub fn set_restart_counter(&mut self, id: &NodeId, restart_counter: u64) {
        if let Some(n) = self.by_id.get_mut(id) {
            if restart_counter > n.restart_counter {
                n.restart_counter = restart_counter;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn neighbour(id: NodeId) -> Neighbour {
        Neighbour {
            id,
            host: "127.0.0.1".into(),
            port: 5377,
            status: NodeStatus::Alive,
            access: AccessMode::Direct,
            restart_counter: 1,
            tx: 0,
            payload: Payload::new(),
            updated_at: 0,
        }
    }

    #[test]
    fn rejects_self_as_neighbour() {
        let mut table = NeighbourTable::new();
        let id = Uuid::new_v4();
        let err = table.upsert(id, 10, neighbour(id), 1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidEvent { .. }));
    }

    #[test]
    fn cluster_size_one_admits_no_neighbours() {
        let mut table = NeighbourTable::new();
        let self_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let err = table.upsert(self_id, 1, neighbour(other), 1).unwrap_err();
        assert!(matches!(err, CoreError::ClusterSizeExceeded));
    }

    #[test]
    fn cluster_size_three_admits_two_neighbours() {
        let mut table = NeighbourTable::new();
        let self_id = Uuid::new_v4();
        table.upsert(self_id, 3, neighbour(Uuid::new_v4()), 1).unwrap();
        table.upsert(self_id, 3, neighbour(Uuid::new_v4()), 1).unwrap();
        let err = table
            .upsert(self_id, 3, neighbour(Uuid::new_v4()), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::ClusterSizeExceeded));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn upsert_never_lowers_incarnation() {
        let mut table = NeighbourTable::new();
        let self_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut first = neighbour(other);
        first.restart_counter = 5;
        first.tx = 10;
        table.upsert(self_id, 10, first, 1).unwrap();

        let mut stale = neighbour(other);
        stale.restart_counter = 3;
        stale.tx = 1;
        table.upsert(self_id, 10, stale, 2).unwrap();

        let stored = table.get(&other).unwrap();
        assert_eq!(stored.restart_counter, 5);
        assert_eq!(stored.tx, 10);
        assert_eq!(stored.updated_at, 2);
    }

    #[test]
    fn delete_all_returns_count() {
        let mut table = NeighbourTable::new();
        let self_id = Uuid::new_v4();
        table.upsert(self_id, 10, neighbour(Uuid::new_v4()), 1).unwrap();
        table.upsert(self_id, 10, neighbour(Uuid::new_v4()), 1).unwrap();
        assert_eq!(table.delete_all(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn oldest_respects_status_filter() {
        let mut table = NeighbourTable::new();
        let self_id = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut na = neighbour(a);
        na.status = NodeStatus::Suspect;
        table.upsert(self_id, 10, na, 5).unwrap();
        table.upsert(self_id, 10, neighbour(b), 1).unwrap();

        let oldest_alive = table.oldest(Some(&[NodeStatus::Alive])).unwrap();
        assert_eq!(oldest_alive.id, b);
    }
}

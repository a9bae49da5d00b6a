//! Node status and access-mode enums (§3, §4.2).

use serde::{Deserialize, Serialize};

/// Lifecycle status of a node or neighbour (§4.2).
///
/// Allowed transitions (enforced by `skipjack-core`, not by this enum):
/// `Stop -> Join` (via the join entry point), `Join -> Alive` (on
/// self-confirmation), `Alive <-> Suspect`, `Alive -> Left`, any `-> Dead`,
/// any `-> Stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Stop,
    Left,
    Dead,
    Alive,
    Suspect,
    Join,
}

impl NodeStatus {
    /// Wire status code used in the compact neighbour digest tuple (§3).
    pub const fn code(self) -> u8 {
        match self {
            NodeStatus::Stop => 0,
            NodeStatus::Left => 1,
            NodeStatus::Dead => 2,
            NodeStatus::Alive => 3,
            NodeStatus::Suspect => 4,
            NodeStatus::Join => 5,
        }
    }

    /// Decode a status code from the wire. `None` for an unrecognized code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NodeStatus::Stop),
            1 => Some(NodeStatus::Left),
            2 => Some(NodeStatus::Dead),
            3 => Some(NodeStatus::Alive),
            4 => Some(NodeStatus::Suspect),
            5 => Some(NodeStatus::Join),
            _ => None,
        }
    }

    /// "Alive-ish" per §4.2: `{alive, suspect}`.
    pub const fn is_alive_ish(self) -> bool {
        matches!(self, NodeStatus::Alive | NodeStatus::Suspect)
    }
}

/// Whether the last successful probe reached a neighbour directly or via an
/// intermediary (§4.3 `set-nb-direct-access` / `set-nb-indirect-access`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Direct,
    Indirect,
}

impl AccessMode {
    pub const fn code(self) -> u8 {
        match self {
            AccessMode::Direct => 0,
            AccessMode::Indirect => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AccessMode::Direct),
            1 => Some(AccessMode::Indirect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_spec() {
        assert_eq!(NodeStatus::Stop.code(), 0);
        assert_eq!(NodeStatus::Left.code(), 1);
        assert_eq!(NodeStatus::Dead.code(), 2);
        assert_eq!(NodeStatus::Alive.code(), 3);
        assert_eq!(NodeStatus::Suspect.code(), 4);
        assert_eq!(NodeStatus::Join.code(), 5);
    }

    #[test]
    fn status_roundtrip() {
        for s in [
            NodeStatus::Stop,
            NodeStatus::Left,
            NodeStatus::Dead,
            NodeStatus::Alive,
            NodeStatus::Suspect,
            NodeStatus::Join,
        ] {
            assert_eq!(NodeStatus::from_code(s.code()), Some(s));
        }
        assert_eq!(NodeStatus::from_code(99), None);
    }

    #[test]
    fn alive_ish() {
        assert!(NodeStatus::Alive.is_alive_ish());
        assert!(NodeStatus::Suspect.is_alive_ish());
        assert!(!NodeStatus::Join.is_alive_ish());
        assert!(!NodeStatus::Stop.is_alive_ish());
        assert!(!NodeStatus::Left.is_alive_ish());
        assert!(!NodeStatus::Dead.is_alive_ish());
    }

    #[test]
    fn access_codes() {
        assert_eq!(AccessMode::Direct.code(), 0);
        assert_eq!(AccessMode::Indirect.code(), 1);
        assert_eq!(AccessMode::from_code(0), Some(AccessMode::Direct));
        assert_eq!(AccessMode::from_code(1), Some(AccessMode::Indirect));
        assert_eq!(AccessMode::from_code(7), None);
    }
}

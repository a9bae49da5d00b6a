//! Process-wide, overridable configuration (§6).

use serde::{Deserialize, Serialize};

/// Tunables shared by every node in the process (§6). Loaded once at
/// daemon startup (`skipjack-daemon::config`) and handed to the actor as an
/// owned snapshot; flipped at runtime only under an explicit `RwLock` the
/// way `ochra-daemon::DaemonConfig` is held in `DaemonState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipjackConfig {
    /// Maximum encrypted datagram size in bytes.
    #[serde(default = "default_max_udp_size")]
    pub max_udp_size: usize,
    /// Maximum size in bytes of a node's self-reported payload.
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
    /// Default sample size for an anti-entropy digest.
    #[serde(default = "default_max_anti_entropy_items")]
    pub max_anti_entropy_items: usize,
    /// Period between ping rounds.
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// How long to wait for a direct Ack before retrying or escalating.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    /// How long to wait for an IndirectAck before declaring suspicion.
    #[serde(default = "default_indirect_ack_timeout_ms")]
    pub indirect_ack_timeout_ms: u64,
    /// How long a neighbour stays suspect before being declared dead.
    #[serde(default = "default_suspect_timeout_ms")]
    pub suspect_timeout_ms: u64,
    /// How long a dead neighbour is retained before being purged.
    #[serde(default = "default_dead_retention_ms")]
    pub dead_retention_ms: u64,
    /// Number of direct ping attempts before escalating to indirect probing.
    #[serde(default = "default_direct_ping_max_attempts")]
    pub direct_ping_max_attempts: u32,
    /// Number of intermediaries used for indirect probing.
    #[serde(default = "default_indirect_ping_fanout")]
    pub indirect_ping_fanout: usize,
    /// How long to wait for join confirmation before retrying.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

fn default_max_udp_size() -> usize {
    1432
}

fn default_max_payload_size() -> usize {
    256
}

fn default_max_anti_entropy_items() -> usize {
    2
}

fn default_ping_interval_ms() -> u64 {
    1000
}

fn default_ack_timeout_ms() -> u64 {
    200
}

fn default_indirect_ack_timeout_ms() -> u64 {
    400
}

fn default_suspect_timeout_ms() -> u64 {
    3000
}

fn default_dead_retention_ms() -> u64 {
    30_000
}

fn default_direct_ping_max_attempts() -> u32 {
    1
}

fn default_indirect_ping_fanout() -> usize {
    3
}

fn default_join_timeout_ms() -> u64 {
    2000
}

impl Default for SkipjackConfig {
    fn default() -> Self {
        Self {
            max_udp_size: default_max_udp_size(),
            max_payload_size: default_max_payload_size(),
            max_anti_entropy_items: default_max_anti_entropy_items(),
            ping_interval_ms: default_ping_interval_ms(),
            ack_timeout_ms: default_ack_timeout_ms(),
            indirect_ack_timeout_ms: default_indirect_ack_timeout_ms(),
            suspect_timeout_ms: default_suspect_timeout_ms(),
            dead_retention_ms: default_dead_retention_ms(),
            direct_ping_max_attempts: default_direct_ping_max_attempts(),
            indirect_ping_fanout: default_indirect_ping_fanout(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = SkipjackConfig::default();
        assert_eq!(c.max_udp_size, 1432);
        assert_eq!(c.max_payload_size, 256);
        assert_eq!(c.max_anti_entropy_items, 2);
    }

    #[test]
    fn toml_roundtrip_with_partial_overrides() {
        let toml_str = "max_udp_size = 900\n";
        let c: SkipjackConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(c.max_udp_size, 900);
        assert_eq!(c.max_payload_size, 256);
    }
}

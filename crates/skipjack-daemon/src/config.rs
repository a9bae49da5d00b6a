//! Configuration file management (§6).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use skipjack_types::SkipjackConfig;
use uuid::Uuid;

/// Complete daemon configuration (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Cluster identity and membership settings.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// This node's own listen address and identity.
    #[serde(default)]
    pub node: NodeConfig,
    /// Protocol tunables (§6).
    #[serde(default)]
    pub protocol: SkipjackConfig,
    /// Advanced/observability settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Cluster identity (§3 Cluster).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub namespace: String,
    /// Raw secret token; `secret-key` is derived via SHA-256 (§3, §6).
    #[serde(default)]
    pub secret_token: String,
    #[serde(default = "default_cluster_size")]
    pub cluster_size: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `host:port` pairs probed at startup to discover alive neighbours
    /// before `join` (§4.10).
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// This node's own identity and listen address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_host")]
    pub host: String,
    /// 0 = OS-assigned ephemeral port.
    #[serde(default)]
    pub port: u16,
}

/// Advanced/observability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log file path. Empty = stderr.
    #[serde(default)]
    pub log_file: String,
}

fn default_cluster_size() -> u64 {
    1
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            description: String::new(),
            namespace: String::new(),
            secret_token: String::new(),
            cluster_size: default_cluster_size(),
            tags: Vec::new(),
            seeds: Vec::new(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            host: default_host(),
            port: 0,
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            node: NodeConfig::default(),
            protocol: SkipjackConfig::default(),
            advanced: AdvancedConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location. Falls
    /// back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SKIPJACK_CONFIG") {
            return PathBuf::from(path);
        }
        Self::default_data_dir().join("config.toml")
    }

    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("SKIPJACK_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".skipjack"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/skipjack"))
    }
}

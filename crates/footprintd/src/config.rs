//! Daemon configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Daemon configuration, read from `FOOTPRINTD_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Name reported in structured log events
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// A `cluster.json` file or a directory of them
    #[serde(default = "default_cluster_config")]
    pub cluster_config: PathBuf,

    /// Bin count for histogram requests that do not specify one
    #[serde(default = "default_bins")]
    pub default_bins: usize,

    /// Capacity of the statistics update channel
    #[serde(default = "default_update_buffer")]
    pub update_buffer: usize,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_port() -> u16 {
    8080
}

fn default_cluster_config() -> PathBuf {
    PathBuf::from("./var/clusters")
}

fn default_bins() -> usize {
    10
}

fn default_update_buffer() -> usize {
    64
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            port: default_port(),
            cluster_config: default_cluster_config(),
            default_bins: default_bins(),
            update_buffer: default_update_buffer(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FOOTPRINTD"))
            .build()
            .context("Failed to read FOOTPRINTD_* environment")?;

        config
            .try_deserialize()
            .context("Invalid footprintd configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_bins, 10);
        assert_eq!(config.update_buffer, 64);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DaemonConfig =
            serde_json::from_str(r#"{"port": 9000, "cluster_config": "/etc/cc/clusters"}"#)
                .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.cluster_config, PathBuf::from("/etc/cc/clusters"));
        assert_eq!(config.default_bins, 10);
    }
}

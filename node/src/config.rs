//! Gateway configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::shared_config::CanaryRule;
use crate::NodeError;

/// Configuration for a skiff gateway process.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// WebSocket URL of the pub/sub broker.
    #[serde(default = "default_broker_url")]
    pub broker_url: String,

    /// HTTP URL of the ledger node's RPC endpoint.
    #[serde(default = "default_ledger_url")]
    pub ledger_url: String,

    /// Timeout for one outbound ledger RPC call, in milliseconds. The only
    /// timeout in the system; a timed-out call fails to its caller and is
    /// never retried.
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,

    /// Data directory for the LMDB stores.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Wallet client versions refused at registration. A registration whose
    /// reported version starts with one of these strings is dropped; the
    /// first matching rule wins.
    #[serde(default)]
    pub rejected_wallet_versions: Vec<String>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose the Prometheus metrics endpoint.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Metrics endpoint port (if enabled).
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Canary block hashes and the feature flag each one trips. Kept last:
    /// it serializes as a TOML array of tables.
    #[serde(default)]
    pub canaries: Vec<CanaryRule>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_broker_url() -> String {
    "ws://127.0.0.1:1884".to_string()
}

fn default_ledger_url() -> String {
    "http://127.0.0.1:7076".to_string()
}

fn default_ledger_timeout_ms() -> u64 {
    5_000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./skiff_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    7081
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            ledger_url: default_ledger_url(),
            ledger_timeout_ms: default_ledger_timeout_ms(),
            data_dir: default_data_dir(),
            rejected_wallet_versions: Vec::new(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            metrics_port: default_metrics_port(),
            canaries: Vec::new(),
        }
    }
}

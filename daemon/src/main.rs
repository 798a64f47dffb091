//! Skiff daemon — entry point for running the wallet/work gateway.

use clap::Parser;
use skiff_node::{NodeConfig, SkiffNode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skiff-daemon", about = "Skiff wallet/work gateway daemon")]
struct Cli {
    /// WebSocket URL of the pub/sub broker.
    #[arg(long, env = "SKIFF_BROKER_URL")]
    broker_url: Option<String>,

    /// HTTP URL of the ledger node's RPC endpoint.
    #[arg(long, env = "SKIFF_LEDGER_URL")]
    ledger_url: Option<String>,

    /// Data directory for the LMDB stores.
    #[arg(long, env = "SKIFF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Timeout for one outbound ledger RPC call, in milliseconds.
    #[arg(long, env = "SKIFF_LEDGER_TIMEOUT_MS")]
    ledger_timeout_ms: Option<u64>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "SKIFF_ENABLE_METRICS")]
    metrics: bool,

    /// Metrics endpoint port.
    #[arg(long, env = "SKIFF_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SKIFF_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SKIFF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match NodeConfig::from_toml_file(&path.to_string_lossy()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "failed to load config file {}: {e}, using defaults",
                    path.display()
                );
                NodeConfig::default()
            }
        },
        None => NodeConfig::default(),
    };

    if let Some(url) = cli.broker_url {
        config.broker_url = url;
    }
    if let Some(url) = cli.ledger_url {
        config.ledger_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(timeout) = cli.ledger_timeout_ms {
        config.ledger_timeout_ms = timeout;
    }
    if cli.metrics {
        config.enable_metrics = true;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics_port = port;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    skiff_utils::init_tracing(&config.log_format, &config.log_level);

    tracing::info!(
        broker = %config.broker_url,
        ledger = %config.ledger_url,
        data_dir = %config.data_dir.display(),
        "starting skiff gateway"
    );
    if config.enable_metrics {
        tracing::info!(port = config.metrics_port, "metrics endpoint enabled");
    }

    let started = std::time::Instant::now();
    let node = SkiffNode::new(config)?;
    node.run().await?;

    tracing::info!(
        uptime = %skiff_utils::format_duration(started.elapsed().as_secs()),
        "skiff daemon exited cleanly"
    );
    Ok(())
}

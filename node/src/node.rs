//! Gateway wiring and the run loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;

use skiff_bus::{BusEvent, WsTransport};
use skiff_ledger::HttpLedgerClient;
use skiff_store::{RegistryStore, TimestampStore};
use skiff_store_lmdb::LmdbStore;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::ledger_gateway::LedgerGateway;
use crate::metrics::NodeMetrics;
use crate::metrics_server;
use crate::router::Router;
use crate::shared_config::SharedConfigChannel;

/// A fully wired gateway process.
///
/// Owns the broker connection, the stores, the router and the ledger
/// gateway. [`run`](Self::run) drives inbound events until shutdown.
pub struct SkiffNode {
    config: NodeConfig,
    router: Arc<Router>,
    gateway: Arc<LedgerGateway>,
    metrics: Arc<NodeMetrics>,
    events: mpsc::Receiver<BusEvent>,
}

impl SkiffNode {
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let store = Arc::new(LmdbStore::open(&config.data_dir)?);
        let registry: Arc<dyn RegistryStore + Send + Sync> = store.clone();
        let timestamps: Arc<dyn TimestampStore + Send + Sync> = store;

        let ledger = Arc::new(HttpLedgerClient::new(
            config.ledger_url.clone(),
            Duration::from_millis(config.ledger_timeout_ms),
        )?);

        let (transport, events) = WsTransport::connect(config.broker_url.clone());
        let metrics = Arc::new(NodeMetrics::new());

        let router = Arc::new(Router::new(
            Arc::new(transport),
            registry,
            timestamps.clone(),
            SharedConfigChannel::new(config.canaries.clone()),
            metrics.clone(),
            config.rejected_wallet_versions.clone(),
        ));
        let gateway = Arc::new(LedgerGateway::new(ledger, timestamps, metrics.clone()));

        Ok(Self {
            config,
            router,
            gateway,
            metrics,
            events,
        })
    }

    /// The surface the RPC boundary layer calls for ledger actions.
    pub fn gateway(&self) -> Arc<LedgerGateway> {
        self.gateway.clone()
    }

    /// Entry point for finalized block events from the ledger node (and for
    /// tests driving the router directly).
    pub fn router(&self) -> Arc<Router> {
        self.router.clone()
    }

    /// Drive inbound events until SIGINT/SIGTERM, then drain the handlers
    /// still in flight. Jobs that are queued or not yet delivered are lost
    /// on restart; there is no durable work queue.
    pub async fn run(mut self) -> Result<(), NodeError> {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        if self.config.enable_metrics {
            let metrics = self.metrics.clone();
            let port = self.config.metrics_port;
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move {
                if let Err(e) = metrics_server::serve(metrics, port, shutdown_rx).await {
                    tracing::error!(error = %e, "metrics server failed");
                }
            });
        }

        let stop = stop_signal();
        tokio::pin!(stop);

        let mut handlers: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                _ = &mut stop => break,
                event = self.events.recv() => match event {
                    // One task per inbound message; handlers interleave at
                    // their await points.
                    Some(event) => {
                        let router = self.router.clone();
                        handlers.spawn(async move { router.handle_event(event).await });
                        // Reap whatever already finished so the set stays
                        // bounded by the number of in-flight handlers.
                        while handlers.try_join_next().is_some() {}
                    }
                    None => {
                        tracing::warn!("broker event stream ended");
                        break;
                    }
                },
            }
        }

        // Stop the metrics endpoint and let in-flight handlers finish their
        // state transitions and publishes.
        let _ = shutdown_tx.send(());
        while handlers.join_next().await.is_some() {}

        tracing::info!("gateway stopped");
        Ok(())
    }
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn stop_signal() {
    #[cfg(unix)]
    {
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                // Without a SIGTERM stream we can still stop on Ctrl-C.
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                let _ = signal::ctrl_c().await;
                tracing::info!("received SIGINT, shutting down");
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => tracing::info!("received SIGINT, shutting down"),
            _ = terminate.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        tracing::info!("received SIGINT, shutting down");
    }
}

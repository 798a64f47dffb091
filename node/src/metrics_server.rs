//! HTTP endpoint exposing the Prometheus metrics.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::metrics::NodeMetrics;
use crate::NodeError;

/// Serve `GET /metrics` (Prometheus text format) and `GET /health` until the
/// shutdown signal fires.
pub async fn serve(
    metrics: Arc<NodeMetrics>,
    port: u16,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), NodeError> {
    let router = Router::new()
        .route("/metrics", get(metrics_text))
        .route("/health", get(|| async { "ok" }))
        .with_state(metrics);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "metrics endpoint listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    Ok(())
}

async fn metrics_text(State(metrics): State<Arc<NodeMetrics>>) -> String {
    metrics.encode()
}

//! Prometheus metrics for the skiff gateway.
//!
//! The [`NodeMetrics`] struct owns a dedicated [`Registry`] that the
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

/// Central collection of all gateway-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Total inbound transport messages handed to the router.
    pub messages_received: IntCounter,
    /// Total messages dropped (unknown topic or undecodable payload).
    pub messages_dropped: IntCounter,
    /// Total proof-of-work requests received from wallets.
    pub jobs_received: IntCounter,
    /// Total work answers relayed back to wallets.
    pub answers_relayed: IntCounter,
    /// Total block notifications published to wallets.
    pub notifications_published: IntCounter,
    /// Total bad send blocks refused before reaching the ledger.
    pub bad_sends_prevented: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Current number of jobs awaiting dispatch.
    pub queue_depth: IntGauge,
    /// Current number of online workers.
    pub workers_online: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time a worker spent computing one job, in milliseconds.
    pub work_time_ms: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let messages_received = register_int_counter_with_registry!(
            Opts::new(
                "skiff_messages_received_total",
                "Total inbound transport messages"
            ),
            registry
        )
        .expect("failed to register messages_received counter");

        let messages_dropped = register_int_counter_with_registry!(
            Opts::new(
                "skiff_messages_dropped_total",
                "Total inbound messages dropped"
            ),
            registry
        )
        .expect("failed to register messages_dropped counter");

        let jobs_received = register_int_counter_with_registry!(
            Opts::new(
                "skiff_jobs_received_total",
                "Total proof-of-work requests received"
            ),
            registry
        )
        .expect("failed to register jobs_received counter");

        let answers_relayed = register_int_counter_with_registry!(
            Opts::new(
                "skiff_answers_relayed_total",
                "Total work answers relayed to wallets"
            ),
            registry
        )
        .expect("failed to register answers_relayed counter");

        let notifications_published = register_int_counter_with_registry!(
            Opts::new(
                "skiff_notifications_published_total",
                "Total block notifications published"
            ),
            registry
        )
        .expect("failed to register notifications_published counter");

        let bad_sends_prevented = register_int_counter_with_registry!(
            Opts::new(
                "skiff_bad_sends_prevented_total",
                "Total bad send blocks refused"
            ),
            registry
        )
        .expect("failed to register bad_sends_prevented counter");

        let queue_depth = register_int_gauge_with_registry!(
            Opts::new("skiff_queue_depth", "Jobs awaiting dispatch"),
            registry
        )
        .expect("failed to register queue_depth gauge");

        let workers_online = register_int_gauge_with_registry!(
            Opts::new("skiff_workers_online", "Online workers"),
            registry
        )
        .expect("failed to register workers_online gauge");

        // Exponential buckets covering 1 ms → ~16 s.
        let work_time_ms = register_histogram_with_registry!(
            HistogramOpts::new("skiff_work_time_ms", "Worker compute time in milliseconds")
                .buckets(prometheus::exponential_buckets(1.0, 2.0, 15).unwrap()),
            registry
        )
        .expect("failed to register work_time_ms histogram");

        Self {
            registry,
            messages_received,
            messages_dropped,
            jobs_received,
            answers_relayed,
            notifications_published,
            bad_sends_prevented,
            queue_depth,
            workers_online,
            work_time_ms,
        }
    }

    /// Encode every registered metric as Prometheus text format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "metrics encoding failed");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

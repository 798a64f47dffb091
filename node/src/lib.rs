//! Skiff gateway core.
//!
//! Mediates between wallet clients, a pool of proof-of-work workers and a
//! ledger node over a topic-based publish/subscribe transport: the router
//! classifies inbound messages, the worker pool dispatches PoW jobs, the
//! fan-out engine notifies subscribed wallets of finalized blocks, and the
//! bad-send validator gates block submission to the ledger.

pub mod bad_send;
pub mod config;
pub mod error;
pub mod fanout;
pub mod ledger_gateway;
pub mod metrics;
pub mod metrics_server;
pub mod node;
pub mod outbound;
pub mod router;
pub mod shared_config;
pub mod topics;
pub mod worker_pool;

pub use bad_send::{BadSendValidator, RejectReason, SendVerdict};
pub use config::NodeConfig;
pub use error::NodeError;
pub use fanout::FanoutEngine;
pub use ledger_gateway::LedgerGateway;
pub use metrics::NodeMetrics;
pub use node::SkiffNode;
pub use outbound::Outbound;
pub use router::Router;
pub use shared_config::{CanaryRule, SharedConfig, SharedConfigChannel};
pub use worker_pool::{Job, Worker, WorkerPool};

//! Inbound message routing.
//!
//! One router instance owns the gateway's in-process state: the worker pool,
//! the shared-config channel and the subscribe guard. Handlers take the
//! state lock, perform a synchronous transition, drop the lock, then publish
//! the resulting outbound messages. No lock is held across transport I/O,
//! so other handlers may interleave at every await point.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use skiff_bus::{BusEvent, Transport};
use skiff_store::{RegistryStore, TimestampStore};
use skiff_types::{
    Account, BlockEvent, BlockHash, Timestamp, WalletId, WalletRegistration, WorkNonce,
};

use crate::fanout::FanoutEngine;
use crate::metrics::NodeMetrics;
use crate::outbound::Outbound;
use crate::shared_config::SharedConfigChannel;
use crate::topics::{self, Route, WalletAction, WorkerAction};
use crate::worker_pool::{Job, WorkerPool};

pub struct Router {
    transport: Arc<dyn Transport>,
    registry: Arc<dyn RegistryStore + Send + Sync>,
    fanout: FanoutEngine,
    pool: Mutex<WorkerPool>,
    shared: Mutex<SharedConfigChannel>,
    metrics: Arc<NodeMetrics>,
    subscribed: AtomicBool,
    rejected_wallet_versions: Vec<String>,
}

impl Router {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<dyn RegistryStore + Send + Sync>,
        timestamps: Arc<dyn TimestampStore + Send + Sync>,
        shared: SharedConfigChannel,
        metrics: Arc<NodeMetrics>,
        rejected_wallet_versions: Vec<String>,
    ) -> Self {
        Self {
            transport,
            fanout: FanoutEngine::new(registry.clone(), timestamps),
            registry,
            pool: Mutex::new(WorkerPool::new()),
            shared: Mutex::new(shared),
            metrics,
            subscribed: AtomicBool::new(false),
            rejected_wallet_versions,
        }
    }

    pub async fn handle_event(&self, event: BusEvent) {
        match event {
            BusEvent::Connected => self.subscribe_once().await,
            BusEvent::Message { topic, payload } => self.handle_message(&topic, payload).await,
        }
    }

    /// Subscribe to the topic namespace exactly once; repeated reconnect
    /// events must not re-subscribe.
    async fn subscribe_once(&self) {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            tracing::debug!("broker reconnected, already subscribed");
            return;
        }
        for pattern in topics::NAMESPACE {
            if let Err(e) = self.transport.subscribe(pattern).await {
                tracing::error!(pattern, error = %e, "subscribe failed");
            }
        }
        tracing::info!(patterns = topics::NAMESPACE.len(), "subscribed to namespace");
    }

    pub async fn handle_message(&self, topic: &str, payload: Value) {
        self.metrics.messages_received.inc();
        match topics::classify(topic) {
            Route::Control => {
                tracing::info!(topic, "control command received (unhandled)");
            }
            Route::SharedConfig => {
                self.shared.lock().await.apply_retained(&payload);
            }
            Route::Broadcast { account } => {
                tracing::info!(%account, "broadcast message");
            }
            Route::Worker { id, action } => self.handle_worker(&id, action, payload).await,
            Route::Wallet { id, action } => self.handle_wallet(id, action, payload).await,
            Route::Unknown => {
                self.metrics.messages_dropped.inc();
                tracing::warn!(topic, "message on unknown topic dropped");
            }
        }
    }

    /// Process one finalized block event from the ledger node: trip canary
    /// flags, then fan out notifications to subscribed wallets.
    pub async fn handle_block(&self, payload: Value) {
        let event = match BlockEvent::from_json(&payload) {
            Ok(event) => event,
            Err(e) => {
                self.metrics.messages_dropped.inc();
                tracing::warn!(error = %e, "undecodable block event dropped");
                return;
            }
        };

        let canary = self.shared.lock().await.observe(&event.hash);
        self.publish_all(canary.into_iter().collect()).await;

        let notifications = self.fanout.fan_out(&event, Timestamp::now());
        self.metrics
            .notifications_published
            .inc_by(notifications.len() as u64);
        self.publish_all(notifications).await;
    }

    async fn handle_worker(&self, id: &str, action: WorkerAction, payload: Value) {
        let now = Timestamp::now();
        let outbound = {
            let mut pool = self.pool.lock().await;
            let outbound: Vec<Outbound> = match action {
                WorkerAction::Register => {
                    pool.register_worker(id, payload, now);
                    // A fresh worker may free up the queue.
                    pool.dispatch(now).into_iter().collect()
                }
                WorkerAction::Unregister => {
                    pool.unregister_worker(id, payload);
                    Vec::new()
                }
                WorkerAction::Working => {
                    pool.mark_working(id, now);
                    Vec::new()
                }
                WorkerAction::Answer => match decode_answer(&payload) {
                    Ok(work) => {
                        let outbound = pool.submit_answer(id, work, now);
                        if let Some(elapsed) = outbound
                            .first()
                            .and_then(|o| o.payload.get("time"))
                            .and_then(Value::as_u64)
                        {
                            self.metrics.answers_relayed.inc();
                            self.metrics.work_time_ms.observe(elapsed as f64);
                        }
                        outbound
                    }
                    Err(e) => {
                        self.metrics.messages_dropped.inc();
                        tracing::warn!(worker = id, error = %e, "undecodable answer dropped");
                        Vec::new()
                    }
                },
            };
            self.metrics.queue_depth.set(pool.queue_len() as i64);
            self.metrics.workers_online.set(pool.online_workers() as i64);
            outbound
        };
        self.publish_all(outbound).await;
    }

    async fn handle_wallet(&self, id: WalletId, action: WalletAction, payload: Value) {
        match action {
            WalletAction::Register => self.register_wallet(id, payload),
            WalletAction::Accounts => self.register_legacy(id, payload),
            WalletAction::RequestWork => self.request_work(id, payload).await,
        }
    }

    /// Current-protocol registration: `{accounts: [...], ...meta}`. The
    /// remaining metadata is stored alongside the wallet id.
    fn register_wallet(&self, id: WalletId, payload: Value) {
        let Some(obj) = payload.as_object() else {
            self.metrics.messages_dropped.inc();
            tracing::warn!(wallet = %id, "undecodable registration dropped");
            return;
        };
        let Some(accounts) = account_list(obj.get("accounts")) else {
            self.metrics.messages_dropped.inc();
            tracing::warn!(wallet = %id, "registration without accounts dropped");
            return;
        };

        let mut meta = obj.clone();
        meta.remove("accounts");
        let registration = WalletRegistration::with_meta(id.clone(), Value::Object(meta));
        if let Some(rule) = self.version_rejection(&registration) {
            tracing::warn!(
                wallet = %id,
                rule,
                version = registration.version(),
                "wallet client version refused, registration dropped"
            );
            return;
        }

        if let Err(e) = self
            .registry
            .register_accounts(&accounts, &registration.encode_member())
        {
            tracing::error!(wallet = %id, error = %e, "registration not persisted");
        }
    }

    /// Legacy registration: the payload is a bare array of accounts and the
    /// stored member is the bare wallet id.
    fn register_legacy(&self, id: WalletId, payload: Value) {
        let Some(accounts) = account_list(Some(&payload)) else {
            self.metrics.messages_dropped.inc();
            tracing::warn!(wallet = %id, "undecodable legacy account list dropped");
            return;
        };
        if let Err(e) = self.registry.register_accounts(&accounts, id.as_str()) {
            tracing::error!(wallet = %id, error = %e, "registration not persisted");
        }
    }

    async fn request_work(&self, id: WalletId, payload: Value) {
        let hash = payload
            .get("hash")
            .and_then(Value::as_str)
            .and_then(|s| BlockHash::from_hex(s).ok());
        let account = payload
            .get("account")
            .and_then(Value::as_str)
            .map(Account::new);
        let (Some(hash), Some(account)) = (hash, account) else {
            self.metrics.messages_dropped.inc();
            tracing::warn!(wallet = %id, "undecodable work request dropped");
            return;
        };

        self.metrics.jobs_received.inc();
        let now = Timestamp::now();
        let outbound = {
            let mut pool = self.pool.lock().await;
            let outbound = pool.enqueue_job(Job::new(hash, id, account, now), now);
            self.metrics.queue_depth.set(pool.queue_len() as i64);
            outbound
        };
        self.publish_all(outbound.into_iter().collect()).await;
    }

    /// First matching rule wins. A wallet that reports no version matches no
    /// rule.
    fn version_rejection(&self, registration: &WalletRegistration) -> Option<&str> {
        let version = registration.version()?;
        self.rejected_wallet_versions
            .iter()
            .map(String::as_str)
            .find(|rule| version.starts_with(rule))
    }

    async fn publish_all(&self, outbound: Vec<Outbound>) {
        for message in outbound {
            if let Err(e) = self
                .transport
                .publish(&message.topic, message.payload, message.retain)
                .await
            {
                tracing::error!(topic = message.topic, error = %e, "publish failed");
            }
        }
    }
}

fn decode_answer(payload: &Value) -> Result<WorkNonce, String> {
    payload
        .get("work")
        .and_then(Value::as_str)
        .ok_or_else(|| "answer without work".to_string())
        .and_then(|s| WorkNonce::from_hex(s).map_err(|e| e.to_string()))
}

fn account_list(value: Option<&Value>) -> Option<Vec<Account>> {
    let entries = value?.as_array()?;
    let mut accounts = Vec::with_capacity(entries.len());
    for entry in entries {
        accounts.push(Account::new(entry.as_str()?));
    }
    Some(accounts)
}

//! The gateway surface the RPC boundary layer calls.
//!
//! Almost everything forwards verbatim to the ledger node. Two actions get
//! special treatment: `process` is gated by the bad-send validator, and
//! `blocks_info` responses are augmented with each block's first-seen
//! timestamp.

use serde_json::{json, Value};
use std::sync::Arc;

use skiff_ledger::LedgerRpc;
use skiff_store::TimestampStore;
use skiff_types::BlockHash;

use crate::bad_send::{BadSendValidator, SendVerdict};
use crate::metrics::NodeMetrics;

/// The response for a refused or unverifiable `process`. Identical for every
/// rejection path, so the caller cannot probe the check.
const PROCESS_FAILURE: &str = "Block processing failed";

pub struct LedgerGateway {
    ledger: Arc<dyn LedgerRpc>,
    validator: BadSendValidator,
    timestamps: Arc<dyn TimestampStore + Send + Sync>,
    metrics: Arc<NodeMetrics>,
}

impl LedgerGateway {
    pub fn new(
        ledger: Arc<dyn LedgerRpc>,
        timestamps: Arc<dyn TimestampStore + Send + Sync>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            validator: BadSendValidator::new(ledger.clone()),
            ledger,
            timestamps,
            metrics,
        }
    }

    /// Handle one RPC action, returning the JSON response for the caller.
    pub async fn handle(&self, request: Value) -> Value {
        match request.get("action").and_then(Value::as_str) {
            Some("process") => self.process(request).await,
            Some("blocks_info") => self.blocks_info(request).await,
            _ => self.forward(request).await,
        }
    }

    async fn forward(&self, request: Value) -> Value {
        match self.ledger.call(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "ledger RPC failed");
                json!({"error": "ledger request failed"})
            }
        }
    }

    async fn process(&self, request: Value) -> Value {
        let block = match block_from_request(&request) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable process request refused");
                return json!({"error": PROCESS_FAILURE});
            }
        };

        match self.validator.check(&block).await {
            SendVerdict::Accept => self.forward(request).await,
            SendVerdict::Reject(reason) => {
                self.metrics.bad_sends_prevented.inc();
                tracing::warn!(?reason, "bad send block refused");
                json!({"error": PROCESS_FAILURE})
            }
            // Fail closed: an unverifiable block is refused like a bad one.
            SendVerdict::LookupFailed(detail) => {
                tracing::error!(detail, "send validation lookup failed, block refused");
                json!({"error": PROCESS_FAILURE})
            }
        }
    }

    /// Forward `blocks_info` and attach the stored first-seen timestamp to
    /// every returned block that has one.
    async fn blocks_info(&self, request: Value) -> Value {
        let mut response = match self.ledger.call(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "ledger RPC failed");
                return json!({"error": "ledger request failed"});
            }
        };

        if let Some(blocks) = response.get_mut("blocks").and_then(Value::as_object_mut) {
            for (hash_str, info) in blocks.iter_mut() {
                let Ok(hash) = BlockHash::from_hex(hash_str) else {
                    continue;
                };
                match self.timestamps.get_timestamp(&hash) {
                    Ok(Some(first_seen)) => {
                        if let Some(obj) = info.as_object_mut() {
                            obj.insert("timestamp".into(), Value::from(first_seen.as_millis()));
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // Serve the response without the missing timestamp.
                        tracing::error!(hash = hash_str, error = %e, "timestamp lookup failed");
                    }
                }
            }
        }
        response
    }
}

/// `process` carries its block either inline as an object or as a JSON
/// string (the legacy protocol).
fn block_from_request(request: &Value) -> Result<Value, String> {
    match request.get("block") {
        Some(block @ Value::Object(_)) => Ok(block.clone()),
        Some(Value::String(text)) => serde_json::from_str(text).map_err(|e| e.to_string()),
        _ => Err("process without block".into()),
    }
}

//! Nullable ledger RPC — scripted responses, no network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use skiff_ledger::{BlockInfo, LedgerError, LedgerRpc};
use skiff_types::BlockHash;

/// A scripted ledger node for testing.
///
/// Known blocks are served from an in-memory map; pass-through `call`s pop
/// canned responses. Setting `fail_all` simulates an unreachable node.
pub struct NullLedger {
    blocks: Mutex<HashMap<String, BlockInfo>>,
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<Value>>,
    fail_all: Mutex<bool>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fail_all: Mutex::new(false),
        }
    }

    /// Make `hash` resolvable with the given balance.
    pub fn insert_block(&self, hash: &BlockHash, balance: u128) {
        self.blocks
            .lock()
            .unwrap()
            .insert(hash.to_hex(), BlockInfo { balance });
    }

    /// Queue a canned response for the next pass-through `call`.
    pub fn push_response(&self, response: Value) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// All requests issued so far (for assertions).
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Simulate every RPC failing (timeout / unreachable node).
    pub fn set_fail_all(&self, fail: bool) {
        *self.fail_all.lock().unwrap() = fail;
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRpc for NullLedger {
    async fn call(&self, request: Value) -> Result<Value, LedgerError> {
        self.requests.lock().unwrap().push(request.clone());
        if *self.fail_all.lock().unwrap() {
            return Err(LedgerError::Node("scripted failure".into()));
        }
        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return Ok(response);
        }

        // Serve block_info from the block map so the default trait
        // implementation works against this double too.
        if request.get("action").and_then(Value::as_str) == Some("block_info") {
            let hash = request.get("hash").and_then(Value::as_str).unwrap_or("");
            return Ok(match self.blocks.lock().unwrap().get(hash) {
                Some(info) => serde_json::json!({"balance": info.balance.to_string()}),
                None => serde_json::json!({"error": "Block not found"}),
            });
        }

        Ok(Value::Object(serde_json::Map::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_inserted_blocks() {
        let ledger = NullLedger::new();
        let hash = BlockHash::new([5u8; 32]);
        ledger.insert_block(&hash, 1_000);

        let info = ledger.block_info(&hash).await.unwrap().unwrap();
        assert_eq!(info.balance, 1_000);

        let missing = ledger.block_info(&BlockHash::new([6u8; 32])).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn scripted_failure_propagates() {
        let ledger = NullLedger::new();
        ledger.set_fail_all(true);
        assert!(ledger.block_info(&BlockHash::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn canned_responses_pop_in_order() {
        let ledger = NullLedger::new();
        ledger.push_response(json!({"count": "1"}));
        let response = ledger.call(json!({"action": "block_count"})).await.unwrap();
        assert_eq!(response, json!({"count": "1"}));
    }
}

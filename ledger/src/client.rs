//! HTTP client for the ledger node's JSON action protocol.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use skiff_types::BlockHash;

use crate::LedgerError;

/// The subset of a `block_info` response the gateway cares about. The
/// validation pipeline needs existence plus the balance; nothing reads the
/// block contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Account balance after this block, in raw units.
    pub balance: u128,
}

impl BlockInfo {
    /// Interpret a `block_info` response.
    ///
    /// A "not found" error from the node is an ordinary absent result; any
    /// other node-reported error is a failure.
    pub fn from_response(response: Value) -> Result<Option<Self>, LedgerError> {
        if let Some(error) = response.get("error").and_then(Value::as_str) {
            if error.to_ascii_lowercase().contains("not found") {
                return Ok(None);
            }
            return Err(LedgerError::Node(error.to_string()));
        }

        let balance = response
            .get("balance")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::Malformed("missing balance".into()))?
            .parse::<u128>()
            .map_err(|e| LedgerError::Malformed(format!("balance: {e}")))?;

        Ok(Some(Self { balance }))
    }
}

/// The RPC surface the gateway consumes from the ledger node.
///
/// Kept as a trait so the validation pipeline can run against a scripted
/// double in tests.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Forward an arbitrary action verbatim and return the raw response.
    async fn call(&self, request: Value) -> Result<Value, LedgerError>;

    /// Look up a block by hash: `Ok(None)` when the ledger has no such
    /// block.
    async fn block_info(&self, hash: &BlockHash) -> Result<Option<BlockInfo>, LedgerError> {
        let response = self
            .call(json!({
                "action": "block_info",
                "json_block": "true",
                "hash": hash.to_hex(),
            }))
            .await?;
        BlockInfo::from_response(response)
    }
}

/// Reqwest-backed client. The per-request timeout is the only timeout in the
/// system; a timed-out call fails to its caller and is never retried.
pub struct HttpLedgerClient {
    url: String,
    client: reqwest::Client,
}

impl HttpLedgerClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl LedgerRpc for HttpLedgerClient {
    async fn call(&self, request: Value) -> Result<Value, LedgerError> {
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))
    }
}

//! The bad-send validation pipeline.
//!
//! Gates only the "submit block to ledger" action. A purported send whose
//! link names an existing block is a receive mislabeled as a send; a send
//! whose link is the zero-hash burns the funds. Both are refused before they
//! reach the ledger. The pipeline fails closed: anything it cannot verify
//! comes back as [`SendVerdict::LookupFailed`], which the gateway maps to
//! the same generic failure as a rejection so the check never becomes an
//! oracle.

use serde_json::Value;
use std::sync::Arc;

use skiff_ledger::LedgerRpc;
use skiff_types::BlockHash;

/// Why a candidate block was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The send's link is the zero-hash burn address.
    BurnLink,
    /// The link names an existing block: a receive mislabeled as a send.
    DisguisedReceive,
}

/// Outcome of the validation pipeline.
///
/// `LookupFailed` is a distinct variant so the fail-closed mapping to a
/// rejection is an explicit branch at the boundary rather than an implicit
/// catch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendVerdict {
    Accept,
    Reject(RejectReason),
    LookupFailed(String),
}

/// Decides whether a candidate block may be submitted to the ledger.
pub struct BadSendValidator {
    ledger: Arc<dyn LedgerRpc>,
}

impl BadSendValidator {
    pub fn new(ledger: Arc<dyn LedgerRpc>) -> Self {
        Self { ledger }
    }

    /// Run the pipeline against one candidate block (the JSON block
    /// contents as submitted for processing).
    pub async fn check(&self, block: &Value) -> SendVerdict {
        let previous = match field_hash(block, "previous") {
            Ok(hash) => hash,
            Err(e) => return SendVerdict::LookupFailed(e),
        };
        // An open block has nothing before it to compare against.
        if previous.is_zero() {
            return SendVerdict::Accept;
        }

        let prev_info = match self.ledger.block_info(&previous).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                return SendVerdict::LookupFailed(format!("previous block {previous} not in ledger"))
            }
            Err(e) => return SendVerdict::LookupFailed(e.to_string()),
        };

        let new_balance = match field_balance(block) {
            Ok(balance) => balance,
            Err(e) => return SendVerdict::LookupFailed(e),
        };
        // A balance that does not strictly drop sends nothing.
        if new_balance >= prev_info.balance {
            return SendVerdict::Accept;
        }

        let link = match field_hash(block, "link") {
            Ok(hash) => hash,
            Err(e) => return SendVerdict::LookupFailed(e),
        };
        if link.is_zero() {
            return SendVerdict::Reject(RejectReason::BurnLink);
        }

        match self.ledger.block_info(&link).await {
            Ok(Some(_)) => SendVerdict::Reject(RejectReason::DisguisedReceive),
            Ok(None) => SendVerdict::Accept,
            Err(e) => SendVerdict::LookupFailed(e.to_string()),
        }
    }
}

fn field_hash(block: &Value, field: &str) -> Result<BlockHash, String> {
    block
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("block without {field}"))
        .and_then(|s| BlockHash::from_hex(s).map_err(|e| format!("{field}: {e}")))
}

fn field_balance(block: &Value) -> Result<u128, String> {
    block
        .get("balance")
        .and_then(Value::as_str)
        .ok_or_else(|| "block without balance".to_string())
        .and_then(|s| s.parse::<u128>().map_err(|e| format!("balance: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skiff_nullables::NullLedger;

    fn hex(byte: u8) -> String {
        format!("{:02X}", byte).repeat(32)
    }

    fn validator() -> (Arc<NullLedger>, BadSendValidator) {
        let ledger = Arc::new(NullLedger::new());
        let validator = BadSendValidator::new(ledger.clone());
        (ledger, validator)
    }

    /// A send-shaped candidate: previous exists with balance 100.
    fn candidate(balance: &str, link: &str) -> Value {
        json!({
            "type": "state",
            "previous": hex(0x01),
            "balance": balance,
            "link": link,
        })
    }

    fn seed_previous(ledger: &NullLedger) {
        ledger.insert_block(&BlockHash::new([0x01; 32]), 100);
    }

    #[tokio::test]
    async fn open_block_accepts_without_rpc() {
        let (ledger, validator) = validator();
        let block = json!({"previous": BlockHash::ZERO.to_hex(), "balance": "0"});

        assert_eq!(validator.check(&block).await, SendVerdict::Accept);
        assert!(ledger.requests().is_empty(), "no lookup for open blocks");
    }

    #[tokio::test]
    async fn unchanged_balance_is_not_a_send() {
        let (ledger, validator) = validator();
        seed_previous(&ledger);

        let verdict = validator.check(&candidate("100", &hex(0x02))).await;
        assert_eq!(verdict, SendVerdict::Accept);
    }

    #[tokio::test]
    async fn send_to_burn_address_is_rejected() {
        let (ledger, validator) = validator();
        seed_previous(&ledger);

        let verdict = validator
            .check(&candidate("40", &BlockHash::ZERO.to_hex()))
            .await;
        assert_eq!(verdict, SendVerdict::Reject(RejectReason::BurnLink));
    }

    #[tokio::test]
    async fn link_to_existing_block_is_a_disguised_receive() {
        let (ledger, validator) = validator();
        seed_previous(&ledger);
        ledger.insert_block(&BlockHash::new([0x03; 32]), 7);

        let verdict = validator.check(&candidate("40", &hex(0x03))).await;
        assert_eq!(verdict, SendVerdict::Reject(RejectReason::DisguisedReceive));
    }

    #[tokio::test]
    async fn link_to_unknown_hash_is_a_genuine_send() {
        let (ledger, validator) = validator();
        seed_previous(&ledger);

        let verdict = validator.check(&candidate("40", &hex(0x04))).await;
        assert_eq!(verdict, SendVerdict::Accept);
    }

    #[tokio::test]
    async fn missing_previous_block_fails_the_lookup() {
        let (_ledger, validator) = validator();
        let verdict = validator.check(&candidate("40", &hex(0x04))).await;
        assert!(matches!(verdict, SendVerdict::LookupFailed(_)));
    }

    #[tokio::test]
    async fn rpc_failure_fails_the_lookup() {
        let (ledger, validator) = validator();
        seed_previous(&ledger);
        ledger.set_fail_all(true);

        let verdict = validator.check(&candidate("40", &hex(0x04))).await;
        assert!(matches!(verdict, SendVerdict::LookupFailed(_)));
    }

    #[tokio::test]
    async fn malformed_balance_fails_the_lookup() {
        let (ledger, validator) = validator();
        seed_previous(&ledger);

        let verdict = validator.check(&candidate("plenty", &hex(0x04))).await;
        assert!(matches!(verdict, SendVerdict::LookupFailed(_)));
    }

    #[tokio::test]
    async fn block_without_previous_fails_the_lookup() {
        let (_ledger, validator) = validator();
        let verdict = validator.check(&json!({"balance": "40"})).await;
        assert!(matches!(verdict, SendVerdict::LookupFailed(_)));
    }
}

//! Inbound block events.
//!
//! The ledger node reports finalized blocks as loosely-typed JSON. We decode
//! them into a tagged variant over the five known block types; a type string
//! we don't recognize becomes [`BlockKind::Unknown`] rather than a parse
//! failure, so the caller can log and drop it deliberately.

use serde_json::Value;

use crate::account::Account;
use crate::error::TypeError;
use crate::hash::BlockHash;
use crate::time::Timestamp;

/// A finalized block event as delivered by the ledger node.
///
/// `raw` keeps the original JSON object so fan-out can republish the block
/// verbatim (plus the attached first-seen timestamp).
#[derive(Clone, Debug)]
pub struct BlockEvent {
    pub hash: BlockHash,
    pub account: Account,
    pub kind: BlockKind,
    raw: Value,
}

/// Type-specific routing fields of a block event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Open,
    Send { destination: Account },
    Receive,
    Change,
    State {
        is_send: bool,
        link_as_account: Option<Account>,
    },
    Unknown { block_type: String },
}

impl BlockEvent {
    /// Decode a block event from the ledger node's JSON shape.
    ///
    /// `hash`, `account` and `type` are mandatory; everything else depends on
    /// the block type. An unrecognized `type` yields `BlockKind::Unknown`.
    pub fn from_json(value: &Value) -> Result<Self, TypeError> {
        let obj = value
            .as_object()
            .ok_or_else(|| TypeError::MalformedBlock("not a JSON object".into()))?;

        let hash = obj
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| TypeError::MalformedBlock("missing hash".into()))
            .and_then(BlockHash::from_hex)?;
        let account = obj
            .get("account")
            .and_then(Value::as_str)
            .map(Account::new)
            .ok_or_else(|| TypeError::MalformedBlock("missing account".into()))?;
        let block_type = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| TypeError::MalformedBlock("missing type".into()))?;

        let kind = match block_type {
            "open" => BlockKind::Open,
            "receive" => BlockKind::Receive,
            "change" => BlockKind::Change,
            "send" => {
                let destination = obj
                    .get("destination")
                    .or_else(|| obj.get("link_as_account"))
                    .and_then(Value::as_str)
                    .map(Account::new)
                    .ok_or_else(|| TypeError::MalformedBlock("send without destination".into()))?;
                BlockKind::Send { destination }
            }
            "state" => BlockKind::State {
                is_send: flag(obj.get("is_send")),
                link_as_account: obj
                    .get("link_as_account")
                    .and_then(Value::as_str)
                    .map(Account::new),
            },
            other => BlockKind::Unknown {
                block_type: other.to_string(),
            },
        };

        Ok(Self {
            hash,
            account,
            kind,
            raw: value.clone(),
        })
    }

    /// The wire name of this block's type (the original string for unknowns).
    pub fn type_str(&self) -> &str {
        match &self.kind {
            BlockKind::Open => "open",
            BlockKind::Send { .. } => "send",
            BlockKind::Receive => "receive",
            BlockKind::Change => "change",
            BlockKind::State { .. } => "state",
            BlockKind::Unknown { block_type } => block_type,
        }
    }

    /// The original JSON with the block's first-seen timestamp attached.
    pub fn to_payload(&self, first_seen: Timestamp) -> Value {
        let mut payload = self.raw.clone();
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("timestamp".into(), Value::from(first_seen.as_millis()));
        }
        payload
    }
}

/// Ledger nodes report boolean subtype markers as either a bool or the
/// strings "true"/"false".
fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hex(byte: u8) -> String {
        format!("{:02X}", byte).repeat(32)
    }

    #[test]
    fn decodes_send_with_destination() {
        let event = BlockEvent::from_json(&json!({
            "hash": hex(0xAA),
            "account": "acc_sender",
            "type": "send",
            "destination": "acc_recipient",
        }))
        .unwrap();
        assert_eq!(
            event.kind,
            BlockKind::Send {
                destination: Account::new("acc_recipient")
            }
        );
        assert_eq!(event.type_str(), "send");
    }

    #[test]
    fn send_falls_back_to_link_as_account() {
        let event = BlockEvent::from_json(&json!({
            "hash": hex(0xAB),
            "account": "acc_sender",
            "type": "send",
            "link_as_account": "acc_recipient",
        }))
        .unwrap();
        assert_eq!(
            event.kind,
            BlockKind::Send {
                destination: Account::new("acc_recipient")
            }
        );
    }

    #[test]
    fn send_without_destination_is_malformed() {
        let result = BlockEvent::from_json(&json!({
            "hash": hex(0xAC),
            "account": "acc_sender",
            "type": "send",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn decodes_state_send_with_string_flag() {
        let event = BlockEvent::from_json(&json!({
            "hash": hex(0x01),
            "account": "acc_a",
            "type": "state",
            "is_send": "true",
            "link_as_account": "acc_b",
        }))
        .unwrap();
        assert_eq!(
            event.kind,
            BlockKind::State {
                is_send: true,
                link_as_account: Some(Account::new("acc_b")),
            }
        );
    }

    #[test]
    fn state_without_markers_is_not_a_send() {
        let event = BlockEvent::from_json(&json!({
            "hash": hex(0x02),
            "account": "acc_a",
            "type": "state",
        }))
        .unwrap();
        assert_eq!(
            event.kind,
            BlockKind::State {
                is_send: false,
                link_as_account: None,
            }
        );
    }

    #[test]
    fn unrecognized_type_is_unknown_not_an_error() {
        let event = BlockEvent::from_json(&json!({
            "hash": hex(0x03),
            "account": "acc_a",
            "type": "epoch",
        }))
        .unwrap();
        assert_eq!(
            event.kind,
            BlockKind::Unknown {
                block_type: "epoch".into()
            }
        );
        assert_eq!(event.type_str(), "epoch");
    }

    #[test]
    fn missing_hash_is_an_error() {
        assert!(BlockEvent::from_json(&json!({
            "account": "acc_a",
            "type": "open",
        }))
        .is_err());
    }

    #[test]
    fn payload_carries_first_seen_timestamp() {
        let event = BlockEvent::from_json(&json!({
            "hash": hex(0x04),
            "account": "acc_a",
            "type": "open",
        }))
        .unwrap();
        let payload = event.to_payload(Timestamp::new(12_345));
        assert_eq!(payload["timestamp"], json!(12_345));
        assert_eq!(payload["type"], json!("open"));
    }
}

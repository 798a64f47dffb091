//! Wallet registration records.
//!
//! An account's association set stores one member per registered wallet.
//! Current-protocol wallets store a serialized metadata object embedding the
//! wallet id; legacy wallets store the bare wallet id string. The leading `{`
//! is the structural marker telling the two apart.

use serde_json::Value;

use crate::account::WalletId;
use crate::error::TypeError;

/// A wallet's registration under an account: the wallet id plus optional
/// protocol-capability metadata. Legacy registrations carry no metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct WalletRegistration {
    pub wallet_id: WalletId,
    pub meta: Option<Value>,
}

impl WalletRegistration {
    pub fn legacy(wallet_id: WalletId) -> Self {
        Self {
            wallet_id,
            meta: None,
        }
    }

    /// Build a current-protocol registration. The wallet id is folded into
    /// the metadata object so the stored member is self-describing.
    pub fn with_meta(wallet_id: WalletId, meta: Value) -> Self {
        Self {
            wallet_id,
            meta: Some(meta),
        }
    }

    /// Whether this registration speaks the current protocol (and can
    /// therefore interpret state-block notifications).
    pub fn is_current_protocol(&self) -> bool {
        self.meta.is_some()
    }

    /// The wallet's self-reported client version, when the metadata carries
    /// one.
    pub fn version(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.get("version"))
            .and_then(Value::as_str)
    }

    /// Encode into the stored set-member form.
    pub fn encode_member(&self) -> String {
        match &self.meta {
            None => self.wallet_id.as_str().to_string(),
            Some(meta) => {
                let mut obj = match meta {
                    Value::Object(map) => map.clone(),
                    other => {
                        let mut map = serde_json::Map::new();
                        map.insert("meta".into(), other.clone());
                        map
                    }
                };
                obj.insert("wallet_id".into(), Value::from(self.wallet_id.as_str()));
                Value::Object(obj).to_string()
            }
        }
    }

    /// Decode a stored set member.
    ///
    /// A member with the structural marker must parse as a metadata object
    /// embedding `wallet_id`; failing that is an error for this one entry
    /// (callers skip it, they do not abort the lookup). Anything else is a
    /// bare legacy wallet id.
    pub fn decode_member(member: &str) -> Result<Self, TypeError> {
        if !member.trim_start().starts_with('{') {
            return Ok(Self::legacy(WalletId::new(member)));
        }

        let meta: Value = serde_json::from_str(member)
            .map_err(|e| TypeError::MalformedRegistration(e.to_string()))?;
        let wallet_id = meta
            .get("wallet_id")
            .and_then(Value::as_str)
            .map(WalletId::new)
            .ok_or_else(|| {
                TypeError::MalformedRegistration("metadata object without wallet_id".into())
            })?;
        Ok(Self {
            wallet_id,
            meta: Some(meta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_member_is_the_bare_id() {
        let reg = WalletRegistration::legacy(WalletId::new("wallet-1"));
        assert_eq!(reg.encode_member(), "wallet-1");
        assert!(!reg.is_current_protocol());
    }

    #[test]
    fn member_round_trip_with_meta() {
        let reg = WalletRegistration::with_meta(
            WalletId::new("wallet-2"),
            json!({"version": "1.4.0", "protocol": 2}),
        );
        let member = reg.encode_member();
        let decoded = WalletRegistration::decode_member(&member).unwrap();
        assert_eq!(decoded.wallet_id, WalletId::new("wallet-2"));
        assert!(decoded.is_current_protocol());
        assert_eq!(decoded.version(), Some("1.4.0"));
    }

    #[test]
    fn bare_id_decodes_as_legacy() {
        let decoded = WalletRegistration::decode_member("wallet-3").unwrap();
        assert_eq!(decoded, WalletRegistration::legacy(WalletId::new("wallet-3")));
    }

    #[test]
    fn marked_but_malformed_member_fails_that_entry() {
        assert!(WalletRegistration::decode_member("{not json").is_err());
        assert!(WalletRegistration::decode_member("{\"no_id\": true}").is_err());
    }
}

//! Shared config singleton and the canary channel.
//!
//! A fixed set of canary block hashes maps to named feature flags. When a
//! canary hash shows up in an inbound block event, its flag is set in the
//! retained `sharedconfig` singleton and the singleton is republished, but
//! only when the flag actually changed: redundant broadcasts are suppressed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use skiff_types::BlockHash;

use crate::outbound::Outbound;
use crate::topics::SHARED_CONFIG_TOPIC;

/// The versioned configuration singleton broadcast on `sharedconfig`.
///
/// Broker-side retention replays the latest value to late subscribers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
}

impl SharedConfig {
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

/// One canary: a designated block hash that trips a named feature flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanaryRule {
    pub hash: BlockHash,
    pub flag: String,
}

/// Owns the in-memory singleton and the canary rules.
pub struct SharedConfigChannel {
    rules: Vec<CanaryRule>,
    current: SharedConfig,
}

impl SharedConfigChannel {
    pub fn new(rules: Vec<CanaryRule>) -> Self {
        Self {
            rules,
            current: SharedConfig::default(),
        }
    }

    pub fn current(&self) -> &SharedConfig {
        &self.current
    }

    /// React to an observed block hash.
    ///
    /// Returns the retained republish when a canary flag flipped; `None` for
    /// non-canary hashes and for flags that are already set.
    pub fn observe(&mut self, hash: &BlockHash) -> Option<Outbound> {
        let flag = self.rules.iter().find(|r| r.hash == *hash)?.flag.clone();
        if self.current.flag(&flag) {
            return None;
        }
        self.current.flags.insert(flag.clone(), true);
        self.current.version += 1;
        tracing::warn!(%hash, flag, "canary block observed, feature flag set");

        let payload =
            serde_json::to_value(&self.current).expect("SharedConfig is always serializable");
        Some(Outbound::retained(SHARED_CONFIG_TOPIC, payload))
    }

    /// Adopt a retained singleton delivered by the broker.
    ///
    /// Versions older than the one in memory are ignored, so sibling
    /// coordinators converge on the latest value instead of ping-ponging.
    pub fn apply_retained(&mut self, payload: &Value) {
        match serde_json::from_value::<SharedConfig>(payload.clone()) {
            Ok(incoming) => {
                if incoming.version < self.current.version {
                    tracing::debug!(
                        incoming = incoming.version,
                        current = self.current.version,
                        "stale sharedconfig ignored"
                    );
                    return;
                }
                self.current = incoming;
            }
            Err(e) => {
                tracing::warn!(error = %e, "undecodable sharedconfig payload dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canary() -> (BlockHash, SharedConfigChannel) {
        let hash = BlockHash::new([0xCA; 32]);
        let channel = SharedConfigChannel::new(vec![CanaryRule {
            hash,
            flag: "wallet_upgrade".into(),
        }]);
        (hash, channel)
    }

    #[test]
    fn canary_hash_sets_flag_and_republishes() {
        let (hash, mut channel) = canary();

        let out = channel.observe(&hash).expect("flag flipped");
        assert_eq!(out.topic, SHARED_CONFIG_TOPIC);
        assert!(out.retain);
        assert_eq!(out.payload["flags"]["wallet_upgrade"], json!(true));
        assert!(channel.current().flag("wallet_upgrade"));
    }

    #[test]
    fn redundant_broadcast_is_suppressed() {
        let (hash, mut channel) = canary();
        assert!(channel.observe(&hash).is_some());
        assert!(channel.observe(&hash).is_none());
        assert_eq!(channel.current().version, 1);
    }

    #[test]
    fn non_canary_hash_is_ignored() {
        let (_, mut channel) = canary();
        assert!(channel.observe(&BlockHash::new([0x11; 32])).is_none());
        assert_eq!(channel.current(), &SharedConfig::default());
    }

    #[test]
    fn retained_payload_replaces_singleton() {
        let (_, mut channel) = canary();
        channel.apply_retained(&json!({
            "version": 3,
            "flags": {"wallet_upgrade": true},
        }));
        assert_eq!(channel.current().version, 3);
        assert!(channel.current().flag("wallet_upgrade"));
    }

    #[test]
    fn stale_retained_payload_is_ignored() {
        let (hash, mut channel) = canary();
        channel.observe(&hash);
        channel.apply_retained(&json!({"version": 0, "flags": {}}));
        assert!(channel.current().flag("wallet_upgrade"));
    }

    #[test]
    fn undecodable_payload_is_dropped() {
        let (_, mut channel) = canary();
        channel.apply_retained(&json!({"version": "not a number"}));
        assert_eq!(channel.current(), &SharedConfig::default());
    }
}

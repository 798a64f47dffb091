//! Block fan-out: exactly one notification per interested wallet per block.

use std::collections::HashSet;
use std::sync::Arc;

use skiff_store::{RegistryStore, TimestampStore};
use skiff_types::{Account, BlockEvent, Timestamp, WalletId, WalletRegistration};
use skiff_types::block::BlockKind;

use crate::outbound::Outbound;

/// Decides, per finalized block event, who must be notified.
pub struct FanoutEngine {
    registry: Arc<dyn RegistryStore + Send + Sync>,
    timestamps: Arc<dyn TimestampStore + Send + Sync>,
}

impl FanoutEngine {
    pub fn new(
        registry: Arc<dyn RegistryStore + Send + Sync>,
        timestamps: Arc<dyn TimestampStore + Send + Sync>,
    ) -> Self {
        Self {
            registry,
            timestamps,
        }
    }

    /// Compute the notifications for one block event.
    ///
    /// The first-seen timestamp is created on first observation (or the
    /// previously stored value reused) and attached to every published
    /// payload. A wallet registered under both interested accounts is
    /// notified once.
    pub fn fan_out(&self, event: &BlockEvent, now: Timestamp) -> Vec<Outbound> {
        if let BlockKind::Unknown { block_type } = &event.kind {
            tracing::warn!(hash = %event.hash, block_type, "unrecognized block type dropped");
            return Vec::new();
        }

        let first_seen = match self.timestamps.create_timestamp(&event.hash, now) {
            Ok(winner) => winner,
            Err(e) => {
                // Keep notifying even when the cache is unavailable.
                tracing::error!(hash = %event.hash, error = %e, "timestamp cache unavailable");
                now
            }
        };
        let payload = event.to_payload(first_seen);

        // State blocks carry a representation only current-protocol wallets
        // can interpret.
        let current_protocol_only = matches!(event.kind, BlockKind::State { .. });

        let mut notified: HashSet<WalletId> = HashSet::new();
        let mut outbound = Vec::new();
        for account in interested_accounts(event) {
            let members = match self.registry.members_for_account(&account) {
                Ok(members) => members,
                Err(e) => {
                    tracing::error!(account = %account, error = %e, "registry lookup failed");
                    continue;
                }
            };

            for member in members {
                let registration = match WalletRegistration::decode_member(&member) {
                    Ok(registration) => registration,
                    Err(e) => {
                        tracing::warn!(
                            account = %account,
                            error = %e,
                            "skipping malformed registration member"
                        );
                        continue;
                    }
                };
                if current_protocol_only && !registration.is_current_protocol() {
                    tracing::warn!(
                        wallet = %registration.wallet_id,
                        hash = %event.hash,
                        "legacy wallet cannot interpret state blocks, skipped"
                    );
                    continue;
                }
                if !notified.insert(registration.wallet_id.clone()) {
                    continue;
                }
                outbound.push(Outbound::new(
                    format!("wallet/{}/block/{}", registration.wallet_id, event.type_str()),
                    payload.clone(),
                ));
            }
        }
        outbound
    }
}

/// The accounts whose registrations must be notified for this block.
fn interested_accounts(event: &BlockEvent) -> Vec<Account> {
    let mut accounts = vec![event.account.clone()];
    match &event.kind {
        BlockKind::Send { destination } => {
            if *destination != event.account {
                accounts.push(destination.clone());
            }
        }
        BlockKind::State {
            is_send: true,
            link_as_account: Some(destination),
        } => {
            if *destination != event.account {
                accounts.push(destination.clone());
            }
        }
        _ => {}
    }
    accounts
}

//! Topic namespace and inbound classification.

use skiff_types::{Account, WalletId};

/// The retained shared-config topic.
pub const SHARED_CONFIG_TOPIC: &str = "sharedconfig";

/// The gateway control channel.
pub const CONTROL_TOPIC: &str = "control/skiffd";

/// Every pattern the gateway subscribes to on startup.
pub const NAMESPACE: &[&str] = &[
    "worker/+/register",
    "worker/+/unregister",
    "worker/+/working",
    "worker/+/answer",
    "wallet/+/register",
    "wallet/+/accounts",
    "wallet/+/requestwork",
    "broadcast/+",
    SHARED_CONFIG_TOPIC,
    CONTROL_TOPIC,
];

/// Where an inbound message goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Control,
    SharedConfig,
    Worker { id: String, action: WorkerAction },
    Wallet { id: WalletId, action: WalletAction },
    Broadcast { account: Account },
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerAction {
    Register,
    Unregister,
    Working,
    Answer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletAction {
    Register,
    Accounts,
    RequestWork,
}

/// Classify an inbound topic: exact names first, then the wallet / worker /
/// broadcast wildcard families with their embedded identifiers.
pub fn classify(topic: &str) -> Route {
    match topic {
        CONTROL_TOPIC => return Route::Control,
        SHARED_CONFIG_TOPIC => return Route::SharedConfig,
        _ => {}
    }

    let levels: Vec<&str> = topic.split('/').collect();
    match levels.as_slice() {
        ["worker", id, action] if !id.is_empty() => {
            let action = match *action {
                "register" => WorkerAction::Register,
                "unregister" => WorkerAction::Unregister,
                "working" => WorkerAction::Working,
                "answer" => WorkerAction::Answer,
                _ => return Route::Unknown,
            };
            Route::Worker {
                id: id.to_string(),
                action,
            }
        }
        ["wallet", id, action] if !id.is_empty() => {
            let action = match *action {
                "register" => WalletAction::Register,
                "accounts" => WalletAction::Accounts,
                "requestwork" => WalletAction::RequestWork,
                _ => return Route::Unknown,
            };
            Route::Wallet {
                id: WalletId::new(*id),
                action,
            }
        }
        ["broadcast", account] if !account.is_empty() => Route::Broadcast {
            account: Account::new(*account),
        },
        _ => Route::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_topics_classify_first() {
        assert_eq!(classify("control/skiffd"), Route::Control);
        assert_eq!(classify("sharedconfig"), Route::SharedConfig);
    }

    #[test]
    fn worker_family_extracts_id() {
        assert_eq!(
            classify("worker/w-42/answer"),
            Route::Worker {
                id: "w-42".into(),
                action: WorkerAction::Answer
            }
        );
        assert_eq!(
            classify("worker/w-42/register"),
            Route::Worker {
                id: "w-42".into(),
                action: WorkerAction::Register
            }
        );
    }

    #[test]
    fn wallet_family_extracts_id() {
        assert_eq!(
            classify("wallet/abc/requestwork"),
            Route::Wallet {
                id: WalletId::new("abc"),
                action: WalletAction::RequestWork
            }
        );
    }

    #[test]
    fn broadcast_family_extracts_account() {
        assert_eq!(
            classify("broadcast/acc_1"),
            Route::Broadcast {
                account: Account::new("acc_1")
            }
        );
    }

    #[test]
    fn unmatched_topics_are_unknown() {
        assert_eq!(classify("worker/w-42/reboot"), Route::Unknown);
        assert_eq!(classify("wallet/abc"), Route::Unknown);
        assert_eq!(classify("wallet//register"), Route::Unknown);
        assert_eq!(classify("something/else"), Route::Unknown);
        assert_eq!(classify(""), Route::Unknown);
    }

    #[test]
    fn namespace_patterns_cover_all_families() {
        use skiff_bus::topic::matches;
        for topic in [
            "worker/w1/register",
            "worker/w1/unregister",
            "worker/w1/working",
            "worker/w1/answer",
            "wallet/a/register",
            "wallet/a/accounts",
            "wallet/a/requestwork",
            "broadcast/acc_1",
            "sharedconfig",
            "control/skiffd",
        ] {
            assert!(
                NAMESPACE.iter().any(|p| matches(p, topic)),
                "namespace should cover {topic}"
            );
        }
    }
}

//! Account → wallet-registration association storage.

use skiff_types::Account;

use crate::StoreError;

/// Maps accounts to the set of wallet registrations subscribed to them.
///
/// Members are stored in their encoded wire form (bare legacy wallet id or
/// serialized metadata object — see `skiff_types::WalletRegistration`).
/// Membership is a set: re-registering an already-present member is a no-op,
/// which is what makes registration safe to replay.
pub trait RegistryStore {
    /// Add `member` to the association set of each listed account.
    fn register_accounts(&self, accounts: &[Account], member: &str) -> Result<(), StoreError>;

    /// All stored members for `account`, in store order. Decoding (and
    /// skipping malformed entries) is the caller's concern — one bad member
    /// must not hide the rest.
    fn members_for_account(&self, account: &Account) -> Result<Vec<String>, StoreError>;
}

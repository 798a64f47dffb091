//! LMDB implementation of the account-registration set.

use skiff_store::{RegistryStore, StoreError};
use skiff_types::Account;

use crate::LmdbStore;

fn backend(e: heed::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl RegistryStore for LmdbStore {
    fn register_accounts(&self, accounts: &[Account], member: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(backend)?;
        for account in accounts {
            // DUP_SORT keeps members as a sorted set of unique values, so a
            // replayed registration lands on the existing member.
            self.registrations
                .put(&mut wtxn, account.as_str(), member)
                .map_err(backend)?;
        }
        wtxn.commit().map_err(backend)?;
        Ok(())
    }

    fn members_for_account(&self, account: &Account) -> Result<Vec<String>, StoreError> {
        let rtxn = self.env.read_txn().map_err(backend)?;
        let Some(iter) = self
            .registrations
            .get_duplicates(&rtxn, account.as_str())
            .map_err(backend)?
        else {
            return Ok(Vec::new());
        };

        let mut members = Vec::new();
        for entry in iter {
            let (_, member) = entry.map_err(backend)?;
            members.push(member.to_string());
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbStore;

    fn temp_store() -> (tempfile::TempDir, LmdbStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path()).expect("open env");
        (dir, store)
    }

    #[test]
    fn register_then_lookup() {
        let (_dir, store) = temp_store();
        let accounts = [Account::new("acc_1"), Account::new("acc_2")];
        store.register_accounts(&accounts, "wallet-a").unwrap();

        assert_eq!(
            store.members_for_account(&accounts[0]).unwrap(),
            vec!["wallet-a".to_string()]
        );
        assert_eq!(
            store.members_for_account(&accounts[1]).unwrap(),
            vec!["wallet-a".to_string()]
        );
    }

    #[test]
    fn re_registration_is_a_no_op() {
        let (_dir, store) = temp_store();
        let accounts = [Account::new("acc_1")];
        store.register_accounts(&accounts, "wallet-a").unwrap();
        store.register_accounts(&accounts, "wallet-a").unwrap();

        assert_eq!(
            store.members_for_account(&accounts[0]).unwrap(),
            vec!["wallet-a".to_string()]
        );
    }

    #[test]
    fn multiple_members_per_account() {
        let (_dir, store) = temp_store();
        let accounts = [Account::new("acc_1")];
        store.register_accounts(&accounts, "wallet-a").unwrap();
        store.register_accounts(&accounts, "wallet-b").unwrap();

        let mut members = store.members_for_account(&accounts[0]).unwrap();
        members.sort();
        assert_eq!(members, vec!["wallet-a".to_string(), "wallet-b".to_string()]);
    }

    #[test]
    fn unknown_account_has_no_members() {
        let (_dir, store) = temp_store();
        assert!(store
            .members_for_account(&Account::new("acc_missing"))
            .unwrap()
            .is_empty());
    }
}

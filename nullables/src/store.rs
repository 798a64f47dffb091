//! Nullable stores — thread-safe in-memory storage for testing.

use skiff_store::{RegistryStore, StoreError, TimestampStore};
use skiff_types::{Account, BlockHash, Timestamp};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

/// An in-memory account-registration set for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullRegistryStore {
    sets: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl NullRegistryStore {
    pub fn new() -> Self {
        Self {
            sets: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for NullRegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryStore for NullRegistryStore {
    fn register_accounts(&self, accounts: &[Account], member: &str) -> Result<(), StoreError> {
        let mut sets = self.sets.lock().unwrap();
        for account in accounts {
            sets.entry(account.as_str().to_string())
                .or_default()
                .insert(member.to_string());
        }
        Ok(())
    }

    fn members_for_account(&self, account: &Account) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .lock()
            .unwrap()
            .get(account.as_str())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}

/// An in-memory first-seen timestamp cache for testing.
pub struct NullTimestampStore {
    times: Mutex<HashMap<String, u64>>,
}

impl NullTimestampStore {
    pub fn new() -> Self {
        Self {
            times: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for NullTimestampStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampStore for NullTimestampStore {
    fn create_timestamp(
        &self,
        hash: &BlockHash,
        now: Timestamp,
    ) -> Result<Timestamp, StoreError> {
        let mut times = self.times.lock().unwrap();
        let winner = *times.entry(hash.to_hex()).or_insert(now.as_millis());
        Ok(Timestamp::new(winner))
    }

    fn get_timestamp(&self, hash: &BlockHash) -> Result<Option<Timestamp>, StoreError> {
        Ok(self
            .times
            .lock()
            .unwrap()
            .get(&hash.to_hex())
            .copied()
            .map(Timestamp::new))
    }
}

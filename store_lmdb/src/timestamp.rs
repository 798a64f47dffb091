//! LMDB implementation of the first-seen timestamp cache.

use skiff_store::{StoreError, TimestampStore};
use skiff_types::{BlockHash, Timestamp};

use crate::LmdbStore;

fn backend(e: heed::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl TimestampStore for LmdbStore {
    fn create_timestamp(
        &self,
        hash: &BlockHash,
        now: Timestamp,
    ) -> Result<Timestamp, StoreError> {
        let key = hash.to_hex();
        // LMDB serializes write transactions across threads and processes,
        // so check-then-insert inside one txn is race-free: the loser of a
        // concurrent create observes the winner's row.
        let mut wtxn = self.env.write_txn().map_err(backend)?;
        if let Some(existing) = self.timestamps.get(&wtxn, &key).map_err(backend)? {
            wtxn.abort();
            return Ok(Timestamp::new(existing));
        }
        self.timestamps
            .put(&mut wtxn, &key, &now.as_millis())
            .map_err(backend)?;
        wtxn.commit().map_err(backend)?;
        Ok(now)
    }

    fn get_timestamp(&self, hash: &BlockHash) -> Result<Option<Timestamp>, StoreError> {
        let rtxn = self.env.read_txn().map_err(backend)?;
        let value = self
            .timestamps
            .get(&rtxn, &hash.to_hex())
            .map_err(backend)?;
        Ok(value.map(Timestamp::new))
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
    fn first_create_wins() {
        let (_dir, store) = temp_store();
        let hash = BlockHash::new([7u8; 32]);

        let first = store.create_timestamp(&hash, Timestamp::new(1_000)).unwrap();
        let second = store.create_timestamp(&hash, Timestamp::new(9_999)).unwrap();

        assert_eq!(first, Timestamp::new(1_000));
        assert_eq!(second, Timestamp::new(1_000));
        assert_eq!(
            store.get_timestamp(&hash).unwrap(),
            Some(Timestamp::new(1_000))
        );
    }

    #[test]
    fn unrecorded_hash_is_absent() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get_timestamp(&BlockHash::new([9u8; 32])).unwrap(), None);
    }

    #[test]
    fn distinct_hashes_do_not_collide() {
        let (_dir, store) = temp_store();
        let a = BlockHash::new([1u8; 32]);
        let b = BlockHash::new([2u8; 32]);
        store.create_timestamp(&a, Timestamp::new(10)).unwrap();
        store.create_timestamp(&b, Timestamp::new(20)).unwrap();

        assert_eq!(store.get_timestamp(&a).unwrap(), Some(Timestamp::new(10)));
        assert_eq!(store.get_timestamp(&b).unwrap(), Some(Timestamp::new(20)));
    }
}

//! First-seen timestamps per block hash.

use skiff_types::{BlockHash, Timestamp};

use crate::StoreError;

/// Idempotent first-seen time per block hash.
///
/// The key is unique: concurrent writers racing to record the same hash
/// converge on a single winning value.
pub trait TimestampStore {
    /// Record `now` as the first-seen time for `hash`, unless one is already
    /// stored. Returns the winning value either way, so callers get
    /// create-or-fetch in one call.
    fn create_timestamp(&self, hash: &BlockHash, now: Timestamp)
        -> Result<Timestamp, StoreError>;

    /// The stored first-seen time, or `None` if the hash has never been
    /// recorded.
    fn get_timestamp(&self, hash: &BlockHash) -> Result<Option<Timestamp>, StoreError>;
}

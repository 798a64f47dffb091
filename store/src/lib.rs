//! Abstract storage traits for the skiff gateway.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the workspace depends only on the traits. Both stores
//! must tolerate true concurrent writers — multiple gateway processes share
//! them — which is why every operation is idempotent (set-add, first-write-
//! wins insert) instead of relying on any in-process lock.

pub mod credential;
pub mod error;
pub mod registry;
pub mod timestamp;

pub use credential::{BrokerCredential, CredentialStore};
pub use error::StoreError;
pub use registry::RegistryStore;
pub use timestamp::TimestampStore;

//! LMDB storage backend for the skiff gateway.
//!
//! Implements the storage traits from `skiff-store` using the `heed` LMDB
//! bindings. Each logical store maps to one named LMDB database within a
//! single environment. LMDB's single-writer transactions and DUP_SORT set
//! semantics give us the idempotence the traits demand without any gateway-
//! level locking, even with several gateway processes sharing the
//! environment.

pub mod credential;
pub mod environment;
pub mod error;
pub mod registry;
pub mod timestamp;

pub use environment::LmdbStore;
pub use error::LmdbError;

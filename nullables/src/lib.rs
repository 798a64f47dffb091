//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (clock, broker transport, ledger RPC, storage) are
//! abstracted behind traits; this crate provides test-friendly
//! implementations that return deterministic values, can be controlled
//! programmatically, and never touch the filesystem or network.
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod store;
pub mod transport;

pub use clock::NullClock;
pub use ledger::NullLedger;
pub use store::{NullRegistryStore, NullTimestampStore};
pub use transport::{NullTransport, PublishedMessage};

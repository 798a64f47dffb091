//! Fundamental types for the skiff gateway.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: block hashes, accounts, wallet ids, timestamps, work nonces,
//! inbound block events and wallet registration records.

pub mod account;
pub mod block;
pub mod error;
pub mod hash;
pub mod registration;
pub mod time;
pub mod work;

pub use account::{Account, WalletId};
pub use block::BlockEvent;
pub use error::TypeError;
pub use hash::BlockHash;
pub use registration::WalletRegistration;
pub use time::Timestamp;
pub use work::WorkNonce;

//! Ledger node RPC client.
//!
//! The ledger node speaks a single-endpoint JSON protocol: POST an object
//! with an `"action"` field, get a JSON object back. Most gateway traffic is
//! pass-through; the typed helpers cover the lookups the validation pipeline
//! needs.

pub mod client;
pub mod error;

pub use client::{BlockInfo, HttpLedgerClient, LedgerRpc};
pub use error::LedgerError;

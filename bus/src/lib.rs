//! Publish/subscribe transport client.
//!
//! The gateway is a client of an external broker; topics are hierarchical
//! with `+` as a single-level wildcard. The broker connection is a WebSocket
//! carrying JSON frames, reconnected with exponential backoff. Everything
//! above this crate talks to the [`Transport`] trait so tests can swap in a
//! recording double.

pub mod error;
pub mod frame;
pub mod topic;
pub mod transport;
pub mod ws;

pub use error::BusError;
pub use frame::Frame;
pub use transport::{BusEvent, Transport};
pub use ws::WsTransport;

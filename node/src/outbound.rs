//! Outbound publish commands.
//!
//! State transitions never perform transport I/O themselves; they return
//! `Outbound` values the caller publishes after the mutation completes.
//! That keeps the suspension points visible and the transitions testable
//! in isolation.

use serde_json::Value;

/// One publish to perform on the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub topic: String,
    pub payload: Value,
    pub retain: bool,
}

impl Outbound {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
            retain: false,
        }
    }

    pub fn retained(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
            retain: true,
        }
    }
}

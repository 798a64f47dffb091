//! Transport abstraction.

use async_trait::async_trait;
use serde_json::Value;

use crate::BusError;

/// Events delivered by the transport to the message router.
#[derive(Clone, Debug)]
pub enum BusEvent {
    /// The broker connection was (re)established. The router decides
    /// whether to subscribe — repeated `Connected` events must not lead to
    /// repeated subscriptions.
    Connected,
    /// An inbound message on a subscribed topic.
    Message { topic: String, payload: Value },
}

/// Outbound side of the broker connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Subscribe to a topic pattern (`+` = single-level wildcard).
    async fn subscribe(&self, pattern: &str) -> Result<(), BusError>;

    /// Publish a payload to a topic. With `retain`, the broker keeps the
    /// last value and replays it to late subscribers.
    async fn publish(&self, topic: &str, payload: Value, retain: bool) -> Result<(), BusError>;
}

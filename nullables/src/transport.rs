//! Nullable transport — record publishes without a broker.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use skiff_bus::{BusError, Transport};

/// One recorded publish.
#[derive(Clone, Debug)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Value,
    pub retain: bool,
}

/// A test transport that records subscriptions and publishes instead of
/// talking to a broker.
pub struct NullTransport {
    subscriptions: Mutex<Vec<String>>,
    published: Mutex<Vec<PublishedMessage>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
        }
    }

    /// All patterns subscribed so far.
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// All messages "published" so far (for assertions).
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Only the publishes whose topic matches `pattern`.
    pub fn published_matching(&self, pattern: &str) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|m| skiff_bus::topic::matches(pattern, &m.topic))
            .cloned()
            .collect()
    }

    /// Clear all recorded state.
    pub fn reset(&self) {
        self.subscriptions.lock().unwrap().clear();
        self.published.lock().unwrap().clear();
    }
}

impl Default for NullTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for NullTransport {
    async fn subscribe(&self, pattern: &str) -> Result<(), BusError> {
        self.subscriptions.lock().unwrap().push(pattern.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Value, retain: bool) -> Result<(), BusError> {
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload,
            retain,
        });
        Ok(())
    }
}

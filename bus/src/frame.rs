//! JSON frames exchanged with the broker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One frame on the broker WebSocket. `subscribe`/`publish` go out,
/// `message` comes in.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Frame {
    Subscribe {
        pattern: String,
    },
    Publish {
        topic: String,
        payload: Value,
        #[serde(default)]
        retain: bool,
    },
    Message {
        topic: String,
        payload: Value,
    },
}

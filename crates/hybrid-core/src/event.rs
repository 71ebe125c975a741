//! Externally-sourced events.
//!
//! An [`Event`] is the payload exchanged between the event forwarder and the
//! agent's ingress endpoint. It is transient: the core never persists it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An event observed by an external source (for example a chain indexer).
///
/// Serialized as `{ "type": "...", "data": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Event {
    /// Creates an event with no data.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: Map::new(),
        }
    }

    /// Adds a data field (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Returns a string field from `data`.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

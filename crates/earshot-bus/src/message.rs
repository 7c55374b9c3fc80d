//! Bus message schema.
//!
//! A [`Message`] is the unit of exchange between a skill and its host
//! assistant: a string `msg_type` naming what happened, a JSON `data` object
//! carrying the payload, and a JSON `context` object carrying routing
//! metadata (session, source, destination) that must survive request/response
//! round-trips.
//!
//! Message types are namespaced by convention: a skill named `ParrotSkill`
//! owns every type under the `parrotskill.` prefix (`parrotskill.success`,
//! `parrotskill.converse.activate`, ...), while host-level types
//! (`converse.ping`, `speak.dialog`) carry no skill prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;

/// A single message on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique, time-ordered message identifier (UUID v7).
    pub id: Uuid,

    /// The message type, e.g. `parrotskill.converse.activate`.
    #[serde(rename = "type")]
    pub msg_type: String,

    /// Payload fields specific to the message type.
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Routing metadata preserved across replies.
    #[serde(default)]
    pub context: Map<String, Value>,

    /// When the message was constructed.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with an empty data and context object.
    #[must_use]
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            msg_type: msg_type.into(),
            data: Map::new(),
            context: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a data field, consuming and returning the message for chaining.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Attach a context field, consuming and returning the message.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Construct a reply to this message.
    ///
    /// The reply gets a fresh id and timestamp, inherits this message's
    /// context unchanged (so the host can route it back to the origin), and
    /// records the replied-to id under the `replying_to` context key.
    #[must_use]
    pub fn reply(&self, msg_type: impl Into<String>) -> Self {
        let mut context = self.context.clone();
        context.insert("replying_to".into(), Value::String(self.id.to_string()));

        Self {
            id: Uuid::now_v7(),
            msg_type: msg_type.into(),
            data: Map::new(),
            context,
            timestamp: Utc::now(),
        }
    }

    /// Fetch a string data field, if present and actually a string.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Deserialize the whole data object into a typed payload.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_attaches_data_and_context() {
        let msg = Message::new("parrotskill.success")
            .with_data("utterance", "hello there")
            .with_context("session", "abc123");

        assert_eq!(msg.msg_type, "parrotskill.success");
        assert_eq!(msg.data_str("utterance"), Some("hello there"));
        assert_eq!(
            msg.context.get("session").and_then(Value::as_str),
            Some("abc123")
        );
    }

    #[test]
    fn reply_preserves_context_and_records_origin() {
        let original = Message::new("parrotskill.query").with_context("session", "abc123");
        let reply = original.reply("parrotskill.timeout");

        assert_eq!(reply.msg_type, "parrotskill.timeout");
        assert_ne!(reply.id, original.id);
        assert_eq!(
            reply.context.get("session").and_then(Value::as_str),
            Some("abc123")
        );
        assert_eq!(
            reply.context.get("replying_to").and_then(Value::as_str),
            Some(original.id.to_string().as_str())
        );
        assert!(reply.data.is_empty());
    }

    #[test]
    fn data_str_ignores_non_string_fields() {
        let msg = Message::new("test").with_data("count", 3);
        assert_eq!(msg.data_str("count"), None);
        assert_eq!(msg.data_str("missing"), None);
    }

    #[test]
    fn payload_as_typed_struct() {
        #[derive(serde::Deserialize)]
        struct Ping {
            skill: String,
        }

        let msg = Message::new("converse.ping").with_data("skill", "parrotskill");
        let ping: Ping = msg.payload_as().expect("payload should decode");
        assert_eq!(ping.skill, "parrotskill");
    }
}

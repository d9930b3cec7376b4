//! Shared message model for the live-update socket.
//!
//! This crate owns the text wire representation exchanged with the dispatch
//! backend's push endpoint: control messages sent by the console, control
//! acknowledgements sent back, and published topic messages. Published
//! payloads stay flexible (`serde_json::Value`); typed parsing happens in the
//! handlers that consume them.
//!
//! ROUTING
//! =======
//! A published message names its topic in an explicit `topic` field and is
//! routed by direct lookup. Servers that predate the `topic` field publish
//! untagged messages; those are classified once here from their shape so the
//! rest of the console only ever sees topic names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Heartbeat request sent as a bare text frame.
pub const PING: &str = "ping";
/// Heartbeat reply received as a bare text frame.
pub const PONG: &str = "pong";

/// Per-event or bulk task completion counters.
pub const TASK_COMPLETION_MAP_UPDATE: &str = "task_completion_map_update";
/// Single task status change acknowledgement.
pub const TASK_COMPLETION_UPDATE: &str = "task_completion_update";
/// A new overview snapshot is available for every center.
pub const EVENT_UPDATES: &str = "event_updates";
/// Prefix of the per-center overview topic, e.g. `central_SRA`.
pub const CENTRAL_TOPIC_PREFIX: &str = "central_";

const LEGACY_TASK_UPDATED: &str = "Event Task Updated";
const LEGACY_OVERVIEW_ADDED: &str = "Overview added successfully";

/// Error returned by [`decode_server_message`] and [`encode_client_message`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text frame is not valid JSON.
    #[error("invalid json message: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON value is not an object.
    #[error("message is not a json object")]
    NotAnObject,
    /// The message carries no topic and matches no known legacy shape.
    #[error("message matches no known topic")]
    Unroutable,
}

/// Build the per-center overview topic name.
#[must_use]
pub fn central_topic(center: &str) -> String {
    format!("{CENTRAL_TOPIC_PREFIX}{center}")
}

/// Control message sent by the console.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    GetTopics,
}

/// Message received from the push endpoint.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// Heartbeat reply.
    Pong,
    /// Server confirmation of a `subscribe` request.
    SubscribeAck { topic: String, success: bool },
    /// Server confirmation of an `unsubscribe` request.
    UnsubscribeAck { topic: String, success: bool },
    /// Topics the server currently holds for this connection.
    Topics(Vec<String>),
    /// Published message delivered to every listed topic, in order.
    Publish { topics: Vec<String>, payload: Value },
}

/// Encode a control message as a JSON text frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_client_message(message: &ClientMessage) -> Result<String, CodecError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for invalid JSON, [`CodecError::NotAnObject`]
/// for non-object JSON, and [`CodecError::Unroutable`] for published messages
/// that name no topic and match no legacy shape.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, CodecError> {
    if text == PONG {
        return Ok(ServerMessage::Pong);
    }

    let value: Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(CodecError::NotAnObject);
    };

    match object.get("type").and_then(Value::as_str) {
        Some("subscribe_ack") => {
            return Ok(ServerMessage::SubscribeAck { topic: ack_topic(&value), success: ack_success(&value) });
        }
        Some("unsubscribe_ack") => {
            return Ok(ServerMessage::UnsubscribeAck { topic: ack_topic(&value), success: ack_success(&value) });
        }
        Some("topics") => {
            let topics = object
                .get("topics")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).map(str::to_owned).collect())
                .unwrap_or_default();
            return Ok(ServerMessage::Topics(topics));
        }
        _ => {}
    }

    if let Some(topic) = object.get("topic").and_then(Value::as_str) {
        return Ok(ServerMessage::Publish { topics: vec![topic.to_owned()], payload: value.clone() });
    }

    let topics = legacy_topics(&value);
    if topics.is_empty() {
        return Err(CodecError::Unroutable);
    }
    Ok(ServerMessage::Publish { topics, payload: value })
}

/// Classify an untagged message by its shape.
///
/// One message may belong to several topics: an overview notification is
/// delivered both to [`EVENT_UPDATES`] and to its center's topic.
#[must_use]
pub fn legacy_topics(value: &Value) -> Vec<String> {
    let mut topics = Vec::new();

    if value.get("Result").and_then(Value::as_str) == Some(LEGACY_TASK_UPDATED) {
        topics.push(TASK_COMPLETION_UPDATE.to_owned());
    }

    if value.get("message").and_then(Value::as_str) == Some(LEGACY_OVERVIEW_ADDED) {
        topics.push(EVENT_UPDATES.to_owned());
        if let Some(center) = value
            .get("data")
            .and_then(|data| data.get("central_id"))
            .and_then(Value::as_str)
            .filter(|center| !center.is_empty())
        {
            topics.push(central_topic(center));
        }
    }

    if value.get("type").and_then(Value::as_str) == Some(TASK_COMPLETION_UPDATE) {
        topics.push(TASK_COMPLETION_MAP_UPDATE.to_owned());
    }

    topics
}

fn ack_topic(value: &Value) -> String {
    value.get("topic").and_then(Value::as_str).unwrap_or_default().to_owned()
}

fn ack_success(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool).unwrap_or(false)
}

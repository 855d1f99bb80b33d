//! Wire framing of the agent's push stream.
//!
//! The agent speaks Socket.IO over Engine.IO v4; a plain JSON envelope
//! (`{"event": ..., "data": ...}` or `["event", data]`) is accepted too so
//! simple relays and test servers can feed the console.

use serde_json::Value;

use crate::errors::EventError;

/// Reply expected by the server after its Engine.IO open packet
pub const NAMESPACE_CONNECT: &str = "40";
/// Reply to an Engine.IO ping
pub const PONG: &str = "3";

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Engine.IO handshake; answer with [`NAMESPACE_CONNECT`]
    Open,
    /// Namespace joined
    Connected,
    /// Engine.IO heartbeat; answer with [`PONG`]
    Ping,
    Event { name: String, payload: Value },
    /// Anything the console has no use for
    Ignored,
}

pub fn parse_frame(text: &str) -> Result<Frame, EventError> {
    let text = text.trim();

    if text.starts_with('{') || text.starts_with('[') {
        return parse_json_frame(text);
    }

    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some('0'), _) => Ok(Frame::Open),
        (Some('2'), _) => Ok(Frame::Ping),
        (Some('4'), Some('0')) => Ok(Frame::Connected),
        (Some('4'), Some('2')) => {
            // Optional "/namespace," and ack id precede the JSON array
            match text.find('[') {
                Some(start) => parse_event_array(&text[start..]),
                None => Err(EventError::malformed("frame", "event packet without payload")),
            }
        }
        _ => Ok(Frame::Ignored),
    }
}

fn parse_json_frame(text: &str) -> Result<Frame, EventError> {
    let value: Value = serde_json::from_str(text).map_err(|e| EventError::malformed("frame", e))?;

    match value {
        Value::Array(items) => event_from_items(items),
        Value::Object(mut object) => {
            let name = match object.remove("event") {
                Some(Value::String(name)) => name,
                _ => return Err(EventError::malformed("frame", "missing event name")),
            };
            let payload = object.remove("data").unwrap_or(Value::Null);
            Ok(Frame::Event { name, payload })
        }
        _ => Err(EventError::malformed("frame", "expected an object or array")),
    }
}

fn parse_event_array(text: &str) -> Result<Frame, EventError> {
    let value: Value = serde_json::from_str(text).map_err(|e| EventError::malformed("frame", e))?;
    match value {
        Value::Array(items) => event_from_items(items),
        _ => Err(EventError::malformed("frame", "expected an event array")),
    }
}

fn event_from_items(items: Vec<Value>) -> Result<Frame, EventError> {
    let mut items = items.into_iter();
    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(EventError::malformed("frame", "event array must start with a name")),
    };
    let payload = items.next().unwrap_or(Value::Null);
    Ok(Frame::Event { name, payload })
}

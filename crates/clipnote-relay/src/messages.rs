//! Relay wire frames.
//!
//! Only the publish exchange is spoken: `["EVENT", <event>]` out and
//! `["OK", <event id>, <accepted>, <reason>]` back. Every other frame is
//! ignored.

use clipnote_core::SignedEvent;
use serde_json::Value;

use crate::error::Result;

/// Client -> relay.
#[derive(Debug, Clone, Copy)]
pub enum ClientMessage<'a> {
    /// Publish an event.
    Event(&'a SignedEvent),
}

impl ClientMessage<'_> {
    /// Encode as a text frame.
    pub fn to_json(&self) -> Result<String> {
        match self {
            ClientMessage::Event(event) => Ok(serde_json::to_string(&("EVENT", event))?),
        }
    }
}

/// Relay -> client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// Publish acknowledgment.
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
}

impl RelayMessage {
    /// Parse a text frame. Unknown or malformed frames yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let frame = value.as_array()?;
        match frame.first()?.as_str()? {
            "OK" => Some(RelayMessage::Ok {
                event_id: frame.get(1)?.as_str()?.to_string(),
                accepted: frame.get(2)?.as_bool()?,
                message: frame
                    .get(3)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
            _ => None,
        }
    }
}

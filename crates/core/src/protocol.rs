// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time channel messages pushed from the backend.
//!
//! Every text frame is a JSON object with a `type` field:
//! - `created` / `updated` / `deleted`: an update action for one snippet
//! - `heartbeat`: keepalive, carries no state
//! - `error`: server-side diagnostic, logged and otherwise ignored

use serde_json::Value;

use crate::action::UpdateAction;
use crate::error::{Error, Result};

/// Messages received over the real-time channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// An update action for one snippet.
    Action(UpdateAction),
    /// Keepalive.
    Heartbeat,
    /// Diagnostic from the server.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ServerMessage {
    /// Decodes a text frame.
    ///
    /// Returns `Error::Decode` for frames that are not valid messages; the
    /// caller drops those without tearing down the connection.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Decode("missing message type".to_string()))?
            .to_owned();

        match kind.as_str() {
            "heartbeat" => Ok(ServerMessage::Heartbeat),
            "error" => {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(ServerMessage::Error { message })
            }
            "created" | "updated" | "deleted" => {
                let action: UpdateAction = serde_json::from_value(value)
                    .map_err(|e| Error::Decode(format!("invalid {kind} action: {e}")))?;
                if action.id.trim().is_empty() {
                    return Err(Error::Decode(format!("{kind} action without id")));
                }
                Ok(ServerMessage::Action(action))
            }
            other => Err(Error::Decode(format!("unknown message type '{other}'"))),
        }
    }

    /// Serializes to a text frame.
    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            ServerMessage::Action(action) => serde_json::to_string(action)?,
            ServerMessage::Heartbeat => r#"{"type":"heartbeat"}"#.to_string(),
            ServerMessage::Error { message } => {
                serde_json::to_string(&serde_json::json!({ "type": "error", "message": message }))?
            }
        };
        Ok(json)
    }

    /// Returns the carried action, if any.
    pub fn into_action(self) -> Option<UpdateAction> {
        match self {
            ServerMessage::Action(action) => Some(action),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

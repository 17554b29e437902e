use anyhow::Result;
use serde_json::Value;

use crate::ParseError;
use crate::client::{RECORD_SEPARATOR, events};
use crate::types::{ChatKind, ChatMessage, TypingStatus};

/// A single hub envelope, partially decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// type 1: the hub invoking a function on us (or echoing one of ours)
    Invocation {
        target: String,
        arguments: Vec<Value>,
        invocation_id: Option<String>,
    },

    /// type 3: acknowledgment for a client invocation
    Completion {
        invocation_id: String,
        error: Option<String>,
    },

    /// type 6: keepalive
    Ping,

    /// type 7: the hub is closing the connection
    Close { error: Option<String> },

    /// Any envelope kind this client does not consume
    Other(u64),
}

/// The three hub events a chat client subscribes to.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    MessageReceived(ChatMessage),
    UserAnnounced { username: String, joined: bool },
    TypingStatusChanged(TypingStatus),
}

/// Parse a complete websocket text frame into hub messages
pub fn parse_frame(frame: &str) -> Result<Vec<HubMessage>> {
    frame
        .split(RECORD_SEPARATOR)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(parse_hub_message)
        .collect()
}

/// Parse a single record-separated chunk into a HubMessage
pub fn parse_hub_message(text: &str) -> Result<HubMessage> {
    let envelope: Value = serde_json::from_str(text).map_err(ParseError::MalformedJson)?;

    let kind = envelope
        .get("type")
        .and_then(Value::as_u64)
        .ok_or_else(|| ParseError::MissingField("type".to_string()))?;

    match kind {
        1 => {
            let target = envelope
                .get("target")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::MissingField("target".to_string()))?
                .to_string();

            let arguments = envelope
                .get("arguments")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let invocation_id = envelope
                .get("invocationId")
                .and_then(Value::as_str)
                .map(str::to_string);

            Ok(HubMessage::Invocation {
                target,
                arguments,
                invocation_id,
            })
        }
        3 => {
            let invocation_id = envelope
                .get("invocationId")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::MissingField("invocationId".to_string()))?
                .to_string();

            let error = envelope
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string);

            Ok(HubMessage::Completion {
                invocation_id,
                error,
            })
        }
        6 => Ok(HubMessage::Ping),
        7 => Ok(HubMessage::Close {
            error: envelope
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        other => Ok(HubMessage::Other(other)),
    }
}

/// Parse the hub's reply to our handshake request.
///
/// An empty object means accepted; anything carrying an `error` field is a
/// rejection.
pub fn parse_handshake_response(text: &str) -> Result<()> {
    let chunk = text
        .split(RECORD_SEPARATOR)
        .find(|chunk| !chunk.trim().is_empty())
        .ok_or_else(|| ParseError::InvalidFormat("empty handshake response".to_string()))?;

    let envelope: Value = serde_json::from_str(chunk).map_err(ParseError::MalformedJson)?;

    if let Some(error) = envelope.get("error").and_then(Value::as_str) {
        anyhow::bail!("Handshake rejected: {}", error);
    }

    Ok(())
}

impl ServerEvent {
    /// Decode a hub invocation into a typed event.
    ///
    /// Targets this client does not subscribe to decode to `None`.
    pub fn from_invocation(target: &str, arguments: &[Value]) -> Result<Option<Self>> {
        match target {
            events::RECEIVE_MESSAGE => {
                let message = arguments
                    .first()
                    .ok_or_else(|| ParseError::MissingField("message".to_string()))?;
                let message: ChatMessage =
                    serde_json::from_value(message.clone()).map_err(ParseError::MalformedJson)?;

                Ok(Some(Self::MessageReceived(message)))
            }
            events::ANNOUNCE_USER => {
                let username = arguments
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| ParseError::MissingField("userName".to_string()))?;
                let joined = arguments
                    .get(1)
                    .and_then(Value::as_bool)
                    .ok_or_else(|| ParseError::MissingField("joined".to_string()))?;

                Ok(Some(Self::UserAnnounced {
                    username: username.to_string(),
                    joined,
                }))
            }
            events::TYPING_STATUS => {
                if arguments.len() < 4 {
                    return Err(
                        ParseError::MissingField("typing status arguments".to_string()).into()
                    );
                }

                let user = arguments[0].as_str().ok_or_else(|| {
                    ParseError::InvalidFormat("user must be a string".to_string())
                })?;
                let kind: ChatKind = serde_json::from_value(arguments[1].clone())
                    .map_err(ParseError::MalformedJson)?;
                let participants: Vec<String> = serde_json::from_value(arguments[2].clone())
                    .map_err(ParseError::MalformedJson)?;
                let is_typing = arguments[3].as_bool().ok_or_else(|| {
                    ParseError::InvalidFormat("isTyping must be a bool".to_string())
                })?;

                Ok(Some(Self::TypingStatusChanged(TypingStatus {
                    user: user.to_string(),
                    kind,
                    participants,
                    is_typing,
                })))
            }
            _ => Ok(None),
        }
    }
}

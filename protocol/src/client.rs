use serde_json::{Value, json};

use crate::types::{ChatMessage, TypingStatus};

/// Terminates every hub message on the wire. One websocket text frame may
/// carry several record-separated messages.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Names of the hub functions both sides invoke.
pub mod events {
    pub const RECEIVE_MESSAGE: &str = "ReceiveMessage";
    pub const ANNOUNCE_USER: &str = "AnnounceUser";
    pub const TYPING_STATUS: &str = "TypingStatus";
    pub const SEND_MESSAGE: &str = "SendMessage";
}

/// Remote calls a client can make on the hub
#[derive(Debug, Clone, PartialEq)]
pub enum ClientInvocation {
    /// SendMessage(message)
    SendMessage(ChatMessage),

    /// TypingStatus(user, type, participants, isTyping)
    TypingStatus(TypingStatus),
}

impl ClientInvocation {
    /// Hub function name this invocation targets
    pub fn target(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => events::SEND_MESSAGE,
            Self::TypingStatus(_) => events::TYPING_STATUS,
        }
    }

    /// Positional arguments as the hub expects them
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            Self::SendMessage(message) => {
                vec![serde_json::to_value(message).unwrap_or(Value::Null)]
            }
            Self::TypingStatus(status) => vec![
                json!(status.user),
                serde_json::to_value(status.kind).unwrap_or(Value::Null),
                json!(status.participants),
                json!(status.is_typing),
            ],
        }
    }

    /// Serialize to wire format: a record-terminated invocation envelope.
    ///
    /// Pass an invocation id to request a completion (acknowledgment) from
    /// the hub; without one the invocation is fire-and-forget.
    pub fn encode(&self, invocation_id: Option<u64>) -> String {
        let mut envelope = json!({
            "type": 1,
            "target": self.target(),
            "arguments": self.arguments(),
        });
        if let Some(id) = invocation_id {
            envelope["invocationId"] = json!(id.to_string());
        }
        format!("{}{}", envelope, RECORD_SEPARATOR)
    }
}

/// The handshake the client must send before any hub traffic.
pub fn handshake_request() -> String {
    format!("{}{}", json!({ "protocol": "json", "version": 1 }), RECORD_SEPARATOR)
}

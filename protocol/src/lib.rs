use thiserror::Error;

pub mod client;
pub mod server;
pub mod types;

pub use client::{ClientInvocation, RECORD_SEPARATOR, events, handshake_request};
pub use server::{
    HubMessage, ServerEvent, parse_frame, parse_handshake_response, parse_hub_message,
};
pub use types::{ChatKind, ChatMessage, TypingStatus};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

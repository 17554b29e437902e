use serde::{Deserialize, Serialize};

/// Whether a conversation is a one-to-one chat or a named group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Direct,
    Group,
}

/// A chat message body as it travels through the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Usernames the message is addressed to.
    pub participants: Vec<String>,
    pub content: String,
}

/// A typing-indicator announcement.
///
/// Carried as four positional arguments on the wire, matching the hub
/// function signature `TypingStatus(user, type, participants, isTyping)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingStatus {
    pub user: String,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub participants: Vec<String>,
    pub is_typing: bool,
}

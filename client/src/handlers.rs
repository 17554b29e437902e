use confab_protocol::{ChatMessage, ClientInvocation, TypingStatus};

pub type MessageHandler = Box<dyn FnMut(&ChatMessage) + Send>;
pub type AnnounceHandler = Box<dyn FnMut(&str, bool) + Send>;
pub type TypingHandler = Box<dyn FnMut(&TypingStatus) + Send>;
pub type ConnectedHandler = Box<dyn FnMut() + Send>;

/// Acknowledgment callback for a single invocation, called with the
/// original invocation once the hub confirms it.
pub type AckHandler = Box<dyn FnOnce(&ClientInvocation) + Send>;

/// One slot per event kind. Registering a handler replaces whatever was
/// there before; an unset slot is skipped at dispatch.
#[derive(Default)]
pub(crate) struct Handlers {
    pub on_receive_message: Option<MessageHandler>,
    pub on_announce_user: Option<AnnounceHandler>,
    pub on_typing_status: Option<TypingHandler>,
    pub on_send_message: Option<MessageHandler>,
    pub on_connected: Option<ConnectedHandler>,
}

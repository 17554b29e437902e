mod account;
mod connection;
mod handlers;
mod session;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use confab_forms::{Credentials, Field, LoginField, LoginForm, SignupData, SignupForm};
pub use confab_protocol::{
    ChatKind, ChatMessage, ClientInvocation, HubMessage, ServerEvent, TypingStatus, events,
};

pub use account::{
    LoadingFlag, NewUserRequest, User, UserDataService, submit_login, submit_signup,
};
pub use connection::ReconnectPolicy;
pub use handlers::{AckHandler, AnnounceHandler, ConnectedHandler, MessageHandler, TypingHandler};
pub use session::Session;

use connection::{Connection, Signal};
use handlers::Handlers;

/// Hub endpoint the demo binaries fall back to
pub const DEFAULT_HUB_URL: &str = "ws://localhost:5095/chatHub";

/// Injected configuration for a [`ChatClient`]
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Hub endpoint without the identity query parameter
    pub hub_url: String,
    pub reconnect: ReconnectPolicy,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            hub_url: DEFAULT_HUB_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Lifecycle of the wrapped hub connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Connected,
    Disconnected,
}

/// Real-time chat hub client.
///
/// Explicitly constructed with its configuration and shared by cloning.
/// Event handlers are single-subscriber slots: the last registration for an
/// event kind wins, there is no fan-out.
///
/// The connected flag is cleared whenever the link drops and is only set
/// again by [`start`](Self::start). The transport reconnects dropped links
/// on its own, but a successful automatic reconnect does NOT restore the
/// flag, so [`invoke`](Self::invoke) stays quiet until `start` is called
/// again.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ChatClientConfig,
    link: Mutex<Link>,
    connected: AtomicBool,
    handlers: Mutex<Handlers>,
    pending: Mutex<HashMap<String, PendingAck>>,
    next_invocation: AtomicU64,
}

struct Link {
    state: ConnectionState,
    hub_url: Option<String>,
    outgoing: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

struct PendingAck {
    invocation: ClientInvocation,
    ack: Option<AckHandler>,
}

impl ChatClient {
    pub fn new(config: ChatClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                link: Mutex::new(Link {
                    state: ConnectionState::Uninitialized,
                    hub_url: None,
                    outgoing: None,
                    task: None,
                }),
                connected: AtomicBool::new(false),
                handlers: Mutex::new(Handlers::default()),
                pending: Mutex::new(HashMap::new()),
                next_invocation: AtomicU64::new(0),
            }),
        }
    }

    /// Bind the connection to an identity.
    ///
    /// Derives the hub URL carrying the identity query parameter. Dispatch
    /// and the on-close hook are wired up when the connection task starts.
    pub fn initialize(&self, identity: &str) {
        if let Ok(mut link) = self.inner.link.lock() {
            link.hub_url = Some(format!("{}?user={}", self.inner.config.hub_url, identity));
            link.state = ConnectionState::Initializing;
        }
    }

    /// Connect to the hub, initializing first if nobody has yet.
    ///
    /// On success the connected flag is set and the connected handler (if
    /// registered) fires. On failure the flag stays false and the error goes
    /// to the log; the caller is not handed an error to deal with.
    pub async fn start(&self, identity: &str) {
        let url = {
            let Ok(link) = self.inner.link.lock() else {
                return;
            };
            if link.state == ConnectionState::Connected {
                tracing::debug!("start ignored, already connected");
                return;
            }
            link.hub_url.clone()
        };

        let url = match url {
            Some(url) => url,
            None => {
                self.initialize(identity);
                match self.inner.link.lock() {
                    Ok(link) => match link.hub_url.clone() {
                        Some(url) => url,
                        None => return,
                    },
                    Err(_) => return,
                }
            }
        };

        match Connection::connect(url, self.inner.config.reconnect.clone()).await {
            Ok(conn) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let task = tokio::spawn(run_connection(Arc::clone(&self.inner), conn, rx));

                if let Ok(mut link) = self.inner.link.lock() {
                    if let Some(old) = link.task.take() {
                        old.abort();
                    }
                    link.outgoing = Some(tx);
                    link.task = Some(task);
                    link.state = ConnectionState::Connected;
                }
                self.inner.connected.store(true, Ordering::SeqCst);
                tracing::info!("Chat hub connected");

                if let Ok(mut handlers) = self.inner.handlers.lock()
                    && let Some(on_connected) = handlers.on_connected.as_mut()
                {
                    on_connected();
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat hub connection failed");
                if let Ok(mut link) = self.inner.link.lock() {
                    link.state = ConnectionState::Disconnected;
                }
            }
        }
    }

    /// Request shutdown of the hub connection.
    ///
    /// The connected flag and pending acknowledgments are cleared
    /// unconditionally; the peer is not waited on.
    pub fn stop(&self) {
        if let Ok(mut link) = self.inner.link.lock() {
            if let Some(task) = link.task.take() {
                task.abort();
            }
            link.outgoing = None;
            if link.state != ConnectionState::Uninitialized {
                link.state = ConnectionState::Disconnected;
            }
        }
        self.inner.connected.store(false, Ordering::SeqCst);
        if let Ok(mut pending) = self.inner.pending.lock() {
            pending.clear();
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner
            .link
            .lock()
            .map(|link| link.state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Invoke a hub function, with an optional acknowledgment callback.
    ///
    /// Does nothing while disconnected: no network call, no callback. When
    /// the hub confirms the invocation, `on_ack` runs with the original
    /// invocation; a confirmation carrying an error is logged and swallowed.
    pub fn invoke(&self, invocation: ClientInvocation, on_ack: Option<AckHandler>) {
        if !self.is_connected() {
            return;
        }
        let outgoing = self
            .inner
            .link
            .lock()
            .ok()
            .and_then(|link| link.outgoing.clone());
        let Some(outgoing) = outgoing else {
            return;
        };

        let id = self.inner.next_invocation.fetch_add(1, Ordering::SeqCst) + 1;
        let text = invocation.encode(Some(id));
        let key = id.to_string();

        if let Ok(mut pending) = self.inner.pending.lock() {
            pending.insert(
                key.clone(),
                PendingAck {
                    invocation,
                    ack: on_ack,
                },
            );
        }

        if outgoing.send(text).is_err() {
            tracing::warn!(invocation = %key, "Hub invocation dropped, connection task is gone");
            if let Ok(mut pending) = self.inner.pending.lock() {
                pending.remove(&key);
            }
        }
    }

    /// Send a chat message, acknowledging through the send-message slot.
    pub fn send_message(&self, message: ChatMessage) {
        let inner = Arc::clone(&self.inner);
        self.invoke(
            ClientInvocation::SendMessage(message),
            Some(Box::new(move |invocation| {
                if let ClientInvocation::SendMessage(message) = invocation
                    && let Ok(mut handlers) = inner.handlers.lock()
                    && let Some(on_send) = handlers.on_send_message.as_mut()
                {
                    on_send(message);
                }
            })),
        );
    }

    /// Announce a typing-status change, fire-and-forget.
    pub fn send_typing_status(&self, status: TypingStatus) {
        self.invoke(ClientInvocation::TypingStatus(status), None);
    }

    pub fn set_receive_message_handler(&self, handler: impl FnMut(&ChatMessage) + Send + 'static) {
        if let Ok(mut handlers) = self.inner.handlers.lock() {
            handlers.on_receive_message = Some(Box::new(handler));
        }
    }

    pub fn set_announce_user_handler(&self, handler: impl FnMut(&str, bool) + Send + 'static) {
        if let Ok(mut handlers) = self.inner.handlers.lock() {
            handlers.on_announce_user = Some(Box::new(handler));
        }
    }

    pub fn set_typing_status_handler(&self, handler: impl FnMut(&TypingStatus) + Send + 'static) {
        if let Ok(mut handlers) = self.inner.handlers.lock() {
            handlers.on_typing_status = Some(Box::new(handler));
        }
    }

    /// Ack slot for [`send_message`](Self::send_message)
    pub fn set_send_message_handler(&self, handler: impl FnMut(&ChatMessage) + Send + 'static) {
        if let Ok(mut handlers) = self.inner.handlers.lock() {
            handlers.on_send_message = Some(Box::new(handler));
        }
    }

    pub fn set_connected_handler(&self, handler: impl FnMut() + Send + 'static) {
        if let Ok(mut handlers) = self.inner.handlers.lock() {
            handlers.on_connected = Some(Box::new(handler));
        }
    }
}

/// Pump the connection: forward queued invocations out, dispatch incoming
/// traffic, and keep the wrapper's flags honest when the link drops.
async fn run_connection(
    inner: Arc<Inner>,
    mut conn: Connection,
    mut outgoing: mpsc::UnboundedReceiver<String>,
) {
    loop {
        tokio::select! {
            queued = outgoing.recv() => match queued {
                Some(text) => {
                    if let Err(e) = conn.send(text).await {
                        tracing::warn!(error = %e, "Hub send failed");
                    }
                }
                None => break,
            },
            signal = conn.recv() => match signal {
                Ok(Signal::Messages(messages)) => {
                    for message in messages {
                        dispatch(&inner, message);
                    }
                }
                Ok(Signal::Lost) => {
                    inner.connected.store(false, Ordering::SeqCst);
                    if let Ok(mut link) = inner.link.lock() {
                        link.state = ConnectionState::Disconnected;
                    }
                    tracing::warn!("Chat hub connection lost");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Chat hub connection closed");
                    inner.connected.store(false, Ordering::SeqCst);
                    if let Ok(mut link) = inner.link.lock() {
                        link.state = ConnectionState::Disconnected;
                    }
                    break;
                }
            }
        }
    }
}

fn dispatch(inner: &Arc<Inner>, message: HubMessage) {
    match message {
        HubMessage::Invocation {
            target, arguments, ..
        } => match ServerEvent::from_invocation(&target, &arguments) {
            Ok(Some(ServerEvent::MessageReceived(message))) => {
                if let Ok(mut handlers) = inner.handlers.lock()
                    && let Some(on_receive) = handlers.on_receive_message.as_mut()
                {
                    on_receive(&message);
                }
            }
            Ok(Some(ServerEvent::UserAnnounced { username, joined })) => {
                if let Ok(mut handlers) = inner.handlers.lock()
                    && let Some(on_announce) = handlers.on_announce_user.as_mut()
                {
                    on_announce(&username, joined);
                }
            }
            Ok(Some(ServerEvent::TypingStatusChanged(status))) => {
                if let Ok(mut handlers) = inner.handlers.lock()
                    && let Some(on_typing) = handlers.on_typing_status.as_mut()
                {
                    on_typing(&status);
                }
            }
            Ok(None) => {
                tracing::debug!(event = %target, "Unhandled hub event");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable hub event");
            }
        },
        HubMessage::Completion {
            invocation_id,
            error,
        } => {
            let entry = inner
                .pending
                .lock()
                .ok()
                .and_then(|mut pending| pending.remove(&invocation_id));

            match (entry, error) {
                (Some(pending), None) => {
                    if let Some(ack) = pending.ack {
                        ack(&pending.invocation);
                    }
                }
                (Some(_), Some(error)) => {
                    tracing::warn!(error = %error, "Hub invocation failed");
                }
                (None, _) => {
                    tracing::debug!(id = %invocation_id, "Completion for unknown invocation");
                }
            }
        }
        HubMessage::Ping => {}
        HubMessage::Close { error } => {
            tracing::warn!(error = ?error, "Hub requested close");
        }
        HubMessage::Other(kind) => {
            tracing::debug!(kind = kind, "Ignoring unsupported hub message");
        }
    }
}

use anyhow::{Context, Result};
use confab_protocol::{HubMessage, handshake_request, parse_frame, parse_handshake_response};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How the transport recovers a dropped link.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub max_attempts: Option<usize>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(5),
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// What a receive produced: hub traffic, or notice that the link dropped.
///
/// `Lost` is surfaced exactly once per drop; the next `recv` reconnects
/// under the policy before reading again.
pub(crate) enum Signal {
    Messages(Vec<HubMessage>),
    Lost,
}

pub(crate) struct Connection {
    ws_stream: WsStream,
    url: String,
    reconnect_policy: ReconnectPolicy,
    dropped: bool,
}

impl Connection {
    /// Open the websocket and complete the hub handshake.
    pub async fn connect(url: String, policy: ReconnectPolicy) -> Result<Self> {
        let ws_stream = Self::establish_connection(&url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Ok(Self {
            ws_stream,
            url,
            reconnect_policy: policy,
            dropped: false,
        })
    }

    async fn establish_connection(url: &str) -> Result<WsStream> {
        let (mut ws_stream, _) = connect_async(url)
            .await
            .with_context(|| "WebSocket handshake failed")?;

        ws_stream
            .send(Message::Text(handshake_request()))
            .await
            .context("Failed to send hub handshake")?;

        loop {
            match ws_stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    parse_handshake_response(&text).context("Hub rejected handshake")?;
                    return Ok(ws_stream);
                }
                Some(Ok(Message::Ping(data))) => {
                    ws_stream
                        .send(Message::Pong(data))
                        .await
                        .context("Failed to send pong")?;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("WebSocket error during hub handshake"),
                None => anyhow::bail!("Connection closed during hub handshake"),
            }
        }
    }

    async fn reconnect(&mut self) -> Result<()> {
        let mut delay = self.reconnect_policy.initial_delay;
        let mut attempt = 1;

        loop {
            if let Some(max) = self.reconnect_policy.max_attempts
                && attempt > max
            {
                anyhow::bail!("Failed to reconnect after {} attempts to {}", max, self.url);
            }

            tokio::time::sleep(delay).await;

            match Self::establish_connection(&self.url).await {
                Ok(ws_stream) => {
                    self.ws_stream = ws_stream;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = ?self.reconnect_policy.max_attempts,
                        error = %e,
                        "Reconnection attempt failed"
                    );
                    attempt += 1;
                    delay = Duration::from_secs_f64(
                        delay.as_secs_f64() * self.reconnect_policy.backoff_multiplier,
                    )
                    .min(self.reconnect_policy.max_delay);
                }
            }
        }
    }

    /// Receive the next batch of hub messages.
    ///
    /// A dropped link is reported once as `Signal::Lost`; the following call
    /// reconnects (with backoff) before reading. Frames that fail to parse
    /// are logged and skipped.
    pub async fn recv(&mut self) -> Result<Signal> {
        if self.dropped {
            self.reconnect()
                .await
                .context("Connection lost and reconnection failed")?;
            self.dropped = false;
        }

        loop {
            match self.ws_stream.next().await {
                Some(Ok(Message::Text(text))) => match parse_frame(&text) {
                    Ok(messages) => return Ok(Signal::Messages(messages)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring malformed hub frame");
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    self.ws_stream
                        .send(Message::Pong(data))
                        .await
                        .context("Failed to send pong")?;
                }
                Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => {
                    self.dropped = true;
                    return Ok(Signal::Lost);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::error!(error = %e, "WebSocket error, will reconnect");
                    self.dropped = true;
                    return Ok(Signal::Lost);
                }
            }
        }
    }

    /// Send an already-encoded hub message
    pub async fn send(&mut self, message: String) -> Result<()> {
        self.ws_stream
            .send(Message::Text(message))
            .await
            .context("Failed to send message")?;
        Ok(())
    }
}

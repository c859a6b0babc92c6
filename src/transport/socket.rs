//! WebSocket dialing and frame-to-event mapping.
//!
//! [`Transport`] owns one WebSocket stream for its whole life. The session
//! loop drives it single-threadedly: `next_event` is the only reader and
//! `send_text` the only writer, so the stream is never split.
//!
//! # Events
//!
//! Frames collapse into three events the session loop cares about:
//!
//! | Event | Produced by |
//! |-------|-------------|
//! | [`TransportEvent::Received`] | Text frame from the remote |
//! | [`TransportEvent::Closed`] | Close frame, or stream end |
//! | [`TransportEvent::Errored`] | I/O or protocol failure |
//!
//! Binary, ping and pong frames are absorbed here (tungstenite answers
//! pings itself); they never surface as events.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Maximum time a dial may take before it counts as failed.
const OPEN_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// TransportEvent
// ============================================================================

/// What the remote end did, as seen by the session loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A text frame arrived.
    Received(String),
    /// The connection ended cleanly, with the remote's close reason if it
    /// gave one.
    Closed {
        /// Reason from the close frame, when present and non-empty.
        reason: Option<String>,
    },
    /// The connection failed mid-flight.
    Errored {
        /// The underlying failure.
        error: Error,
    },
}

// ============================================================================
// Transport
// ============================================================================

/// One live WebSocket connection to the chat backend.
///
/// Values are produced by [`Transport::open`] and owned exclusively by the
/// session loop. There is no internal locking and no background task; all
/// I/O happens inside the caller's `await`s.
#[derive(Debug)]
pub struct Transport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport {
    /// Dials the endpoint and completes the WebSocket handshake.
    ///
    /// # Errors
    ///
    /// [`Error::Connect`] if the dial is refused, fails the handshake, or
    /// exceeds the internal timeout. The endpoint itself is validated
    /// earlier, at build time.
    pub async fn open(endpoint: &Url) -> Result<Self> {
        let dial = connect_async(endpoint.as_str());
        let (stream, response) = match timeout(OPEN_TIMEOUT, dial).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(Error::connect(e.to_string())),
            Err(_) => {
                return Err(Error::connect(format!(
                    "handshake timed out after {}s",
                    OPEN_TIMEOUT.as_secs()
                )));
            }
        };

        debug!(endpoint = %endpoint, status = %response.status(), "WebSocket open");
        Ok(Self { stream })
    }

    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// [`Error::WebSocket`] if the frame cannot be written. The caller
    /// treats any send failure as a lost connection.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        trace!(bytes = text.len(), "Text frame sent");
        Ok(())
    }

    /// Waits for the next event from the remote end.
    ///
    /// Cancel-safe: dropping the future mid-wait loses no frames, which is
    /// what lets the session loop `select!` over this and its command
    /// channel.
    pub async fn next_event(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    trace!(bytes = text.len(), "Text frame received");
                    return TransportEvent::Received(text.as_str().to_owned());
                }

                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|r| !r.is_empty());
                    debug!(reason = ?reason, "WebSocket closed by remote");
                    return TransportEvent::Closed { reason };
                }

                Some(Err(e)) => {
                    return TransportEvent::Errored {
                        error: Error::connection_lost(e.to_string()),
                    };
                }

                None => {
                    debug!("WebSocket stream ended");
                    return TransportEvent::Closed { reason: None };
                }

                // Ignore Binary, Ping, Pong, Frame
                _ => {}
            }
        }
    }

    /// Sends a close frame and shuts the socket down.
    ///
    /// Failures are reported but safe to ignore; the socket is gone either
    /// way once this returns.
    pub async fn close(&mut self) -> Result<()> {
        self.stream
            .close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "client stopping".into(),
            }))
            .await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

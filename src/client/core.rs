//! Chat client coordinator.
//!
//! The [`ChatClient`] struct is the UI-facing handle for one conversation.
//! It owns the transcript and the connection lifecycle; the actual I/O
//! runs in a spawned [session loop](super::session).
//!
//! # Example
//!
//! ```no_run
//! use chatline::ChatClient;
//!
//! # async fn example() -> chatline::Result<()> {
//! let client = ChatClient::builder()
//!     .endpoint("ws://127.0.0.1:8080/ws")
//!     .build()?;
//!
//! client.start()?;
//! client.send("hello")?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::MessageId;
use crate::transcript::{Role, Transcript, TranscriptView};

use super::builder::ClientBuilder;
use super::options::{ClientOptions, SendPolicy};
use super::session::{
    self, Command, MAX_PENDING_LINES, OutboundLine, PendingQueue, SessionContext,
};
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// Handles held while the session loop is running.
struct SessionRuntime {
    /// Channel into the session loop.
    command_tx: mpsc::UnboundedSender<Command>,
    /// The loop task itself, joined by [`ChatClient::stop`].
    task: JoinHandle<()>,
}

/// Internal shared state for the client.
struct ClientInner {
    /// Endpoint to dial, validated at build time.
    endpoint: Url,

    /// Behavior options, fixed at build time.
    options: ClientOptions,

    /// The conversation record.
    transcript: Transcript,

    /// Connection state publisher (shared with the session loop).
    state_tx: Arc<watch::Sender<ConnectionState>>,

    /// Accepted-but-unsent messages (shared with the session loop).
    pending: PendingQueue,

    /// Session runtime, present while started.
    runtime: Mutex<Option<SessionRuntime>>,
}

// ============================================================================
// ChatClient
// ============================================================================

/// Chat connection manager.
///
/// The client is responsible for:
/// - Dialing the endpoint and reconnecting after failures
/// - Keeping the transcript, which survives reconnects
/// - Accepting or refusing sends according to the configured policy
///
/// Handles are cheap to clone and all refer to the same session.
///
/// # Examples
///
/// ```no_run
/// use chatline::ChatClient;
///
/// # async fn example() -> chatline::Result<()> {
/// let client = ChatClient::builder()
///     .endpoint("ws://127.0.0.1:8080/ws")
///     .build()?;
///
/// client.start()?;
/// client.send("hello")?;
/// client.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatClient {
    /// Shared inner state.
    inner: Arc<ClientInner>,
}

// ============================================================================
// ChatClient - Debug
// ============================================================================

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("state", &self.connection_state())
            .field("transcript_len", &self.inner.transcript.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ChatClient - Public API
// ============================================================================

impl ChatClient {
    /// Creates a configuration builder for the client.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use chatline::ChatClient;
    ///
    /// # fn example() -> chatline::Result<()> {
    /// let client = ChatClient::builder()
    ///     .endpoint("ws://127.0.0.1:8080/ws")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Starts the connection lifecycle.
    ///
    /// Spawns the session loop, which dials immediately and keeps
    /// reconnecting after failures until [`ChatClient::stop`]. Calling
    /// this on an already started client is a no-op.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// None currently.
    pub fn start(&self) -> Result<()> {
        let mut runtime = self.inner.runtime.lock();
        if runtime.is_some() {
            debug!("Client already started");
            return Ok(());
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let context = SessionContext {
            endpoint: self.inner.endpoint.clone(),
            options: self.inner.options.clone(),
            transcript: self.inner.transcript.clone(),
            state_tx: Arc::clone(&self.inner.state_tx),
            pending: Arc::clone(&self.inner.pending),
        };

        let task = tokio::spawn(session::run(context, command_rx));
        *runtime = Some(SessionRuntime { command_tx, task });

        info!(endpoint = %self.inner.endpoint, "Client started");
        Ok(())
    }

    /// Stops the connection lifecycle and waits for the session loop to
    /// exit.
    ///
    /// Cancels any pending reconnect timer, performs the close handshake
    /// if a connection is open, and leaves the state at `Disconnected`.
    /// The transcript is untouched. Calling this on a stopped client is a
    /// no-op.
    pub async fn stop(&self) {
        let runtime = self.inner.runtime.lock().take();
        let Some(runtime) = runtime else {
            debug!("Client already stopped");
            return;
        };

        let _ = runtime.command_tx.send(Command::Stop);
        if let Err(e) = runtime.task.await {
            debug!(error = %e, "Session task join failed");
        }

        info!("Client stopped");
    }

    /// Sends a chat message.
    ///
    /// On acceptance the message is echoed into the transcript as a
    /// `user` entry immediately, and its id is returned. Delivery then
    /// happens asynchronously; a message accepted just as the connection
    /// drops is kept and retransmitted on the next connection.
    ///
    /// Acceptance depends on the configured [`SendPolicy`]:
    ///
    /// - [`SendPolicy::Reject`]: accepted only while `Open`
    /// - [`SendPolicy::Enqueue`]: accepted in any state while started, up
    ///   to a queue cap; queued messages are flushed in order once the
    ///   connection opens
    ///
    /// # Errors
    ///
    /// - [`Error::Stopped`] if the client is not started
    /// - [`Error::NotConnected`] if the connection is not open and the
    ///   policy is [`SendPolicy::Reject`]
    /// - [`Error::QueueFull`] if too many accepted messages are already
    ///   waiting for a connection
    pub fn send(&self, text: impl Into<String>) -> Result<MessageId> {
        let runtime = self.inner.runtime.lock();
        let Some(runtime) = runtime.as_ref() else {
            return Err(Error::Stopped);
        };
        if runtime.command_tx.is_closed() {
            return Err(Error::Stopped);
        }

        let state = *self.inner.state_tx.borrow();
        if self.inner.options.send_policy == SendPolicy::Reject && !state.is_open() {
            return Err(Error::not_connected(state));
        }

        let pending = self.inner.pending.lock().len();
        if pending >= MAX_PENDING_LINES {
            warn!(pending, max = MAX_PENDING_LINES, "Pending queue is full");
            return Err(Error::queue_full(pending, MAX_PENDING_LINES));
        }

        let message = self.inner.transcript.append(Role::User, text);
        let _ = runtime.command_tx.send(Command::Send(OutboundLine {
            id: message.id,
            text: message.content,
        }));

        Ok(message.id)
    }

    /// Requests an immediate reconnect attempt.
    ///
    /// Skips whatever remains of the reconnect delay. While a dial is in
    /// progress or the connection is open this does nothing.
    ///
    /// # Errors
    ///
    /// [`Error::Stopped`] if the client is not started.
    pub fn reconnect(&self) -> Result<()> {
        let runtime = self.inner.runtime.lock();
        let Some(runtime) = runtime.as_ref() else {
            return Err(Error::Stopped);
        };

        runtime
            .command_tx
            .send(Command::Reconnect)
            .map_err(|_| Error::Stopped)
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribes to connection state changes.
    ///
    /// Rapid transitions may coalesce; the receiver always ends up at the
    /// latest state.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Returns a read-only view of the transcript.
    ///
    /// The view is live and cheap to clone. Messages enter the transcript
    /// only through [`ChatClient::send`] and the session loop, so holders
    /// of the view can render and subscribe but not append.
    #[inline]
    #[must_use]
    pub fn transcript(&self) -> TranscriptView {
        self.inner.transcript.view()
    }

    /// Subscribes to transcript growth.
    ///
    /// See [`Transcript::revisions`].
    #[must_use]
    pub fn transcript_revisions(&self) -> watch::Receiver<u64> {
        self.inner.transcript.revisions()
    }

    /// Returns the number of accepted messages waiting for a connection.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Returns `true` if the session loop is running.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.runtime.lock().is_some()
    }

    /// Returns the endpoint this client dials.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

// ============================================================================
// ChatClient - Internal API
// ============================================================================

impl ChatClient {
    /// Creates a new client instance.
    ///
    /// Seeds the greeting, if configured, as transcript message 1. The
    /// connection is not dialed until [`ChatClient::start`].
    pub(crate) fn new(endpoint: Url, options: ClientOptions) -> Self {
        let transcript = Transcript::new();
        if let Some(greeting) = &options.greeting {
            transcript.append(Role::System, greeting.clone());
        }

        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(ClientInner {
                endpoint,
                options,
                transcript,
                state_tx: Arc::new(state_tx),
                pending: PendingQueue::default(),
                runtime: Mutex::new(None),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

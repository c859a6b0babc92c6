//! Session loop: the single sequencer behind a [`ChatClient`].
//!
//! One spawned task owns the transport and runs this loop for the whole
//! life of the client. Everything that touches the connection funnels
//! through it, so state transitions, transcript appends and wire writes
//! never race each other.
//!
//! # Phases
//!
//! The loop cycles through three phases, listening for commands in all of
//! them:
//!
//! | Phase | Waiting on | Leaves when |
//! |-------|------------|-------------|
//! | Connecting | `Transport::open` | Dial resolves |
//! | Open | `Transport::next_event` | Connection lost, or stop |
//! | Delay | Reconnect timer | Timer elapses, reconnect, or stop |
//!
//! # Commands
//!
//! | Command | Connecting | Open | Delay |
//! |---------|------------|------|-------|
//! | `Send` | Queue | Transmit | Queue |
//! | `Reconnect` | Ignore | Ignore | Skip remaining delay |
//! | `Stop` | Abandon dial | Close handshake | Cancel timer |
//!
//! A closed command channel is treated exactly like `Stop`: dropping the
//! last client handle tears the session down.
//!
//! [`ChatClient`]: crate::client::ChatClient

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::client::options::ClientOptions;
use crate::client::state::ConnectionState;
use crate::identifiers::{ConnectionEpoch, MessageId};
use crate::transcript::{Role, Transcript};
use crate::transport::{Transport, TransportEvent};

// ============================================================================
// Constants
// ============================================================================

/// Maximum queued messages before new sends are refused.
pub(crate) const MAX_PENDING_LINES: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// Messages accepted but not yet on the wire, oldest first.
///
/// Shared with [`ChatClient`](crate::client::ChatClient), which reads the
/// length for `pending_count` and refuses sends past [`MAX_PENDING_LINES`].
pub(crate) type PendingQueue = Arc<Mutex<VecDeque<OutboundLine>>>;

/// One accepted send: already echoed into the transcript, waiting for or
/// in the middle of transmission.
#[derive(Debug)]
pub(crate) struct OutboundLine {
    /// Transcript id of the local echo.
    pub id: MessageId,
    /// Text to put on the wire.
    pub text: String,
}

// ============================================================================
// Command
// ============================================================================

/// Commands from the client handle to the session loop.
#[derive(Debug)]
pub(crate) enum Command {
    /// Transmit a message that has already been echoed into the
    /// transcript.
    Send(OutboundLine),
    /// Skip whatever remains of the reconnect delay.
    Reconnect,
    /// Terminate the session.
    Stop,
}

// ============================================================================
// SessionContext
// ============================================================================

/// Everything the session loop shares with its client handle.
pub(crate) struct SessionContext {
    /// Endpoint to dial, validated at build time.
    pub endpoint: Url,
    /// Behavior options, fixed for the session.
    pub options: ClientOptions,
    /// Shared transcript; the loop appends inbound lines.
    pub transcript: Transcript,
    /// Publisher for connection state changes, shared with the client
    /// handle.
    pub state_tx: Arc<watch::Sender<ConnectionState>>,
    /// Accepted-but-unsent messages.
    pub pending: PendingQueue,
}

/// What to do once the reconnect window ends.
enum Next {
    Retry,
    Shutdown,
}

impl SessionContext {
    /// Publishes a state change to all observers.
    fn publish(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Connection state changed");
        }
    }

    /// Holds an accepted message for the next time the connection opens.
    fn stash(&self, line: OutboundLine) {
        trace!(id = %line.id, "Message queued");
        self.pending.lock().push_back(line);
    }

    /// Transmits queued messages in FIFO order.
    ///
    /// Returns `false` if a transmission fails; the failed message goes
    /// back to the front of the queue and the connection counts as lost.
    async fn flush_pending(&self, transport: &mut Transport) -> bool {
        let mut flushed = 0usize;
        loop {
            let line = self.pending.lock().pop_front();
            let Some(line) = line else {
                if flushed > 0 {
                    debug!(count = flushed, "Flushed queued messages");
                }
                return true;
            };

            if let Err(e) = transport.send_text(&line.text).await {
                debug!(id = %line.id, error = %e, "Flush failed, message re-queued");
                self.pending.lock().push_front(line);
                return false;
            }
            flushed += 1;
        }
    }

    /// Waits out the reconnect delay, still answering commands.
    ///
    /// Publishes `Disconnected` on entry. Sends arriving here are queued;
    /// a reconnect command skips the remaining delay.
    async fn reconnect_window(&self, command_rx: &mut mpsc::UnboundedReceiver<Command>) -> Next {
        self.publish(ConnectionState::Disconnected);

        let delay = self.options.reconnect_delay;
        debug!(delay_ms = delay.as_millis() as u64, "Waiting before reconnect");

        let timer = sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                () = &mut timer => return Next::Retry,

                command = command_rx.recv() => match command {
                    Some(Command::Send(line)) => self.stash(line),
                    Some(Command::Reconnect) => {
                        debug!("Reconnect requested, skipping remaining delay");
                        return Next::Retry;
                    }
                    Some(Command::Stop) | None => return Next::Shutdown,
                }
            }
        }
    }
}

// ============================================================================
// Session Loop
// ============================================================================

/// Runs the connection lifecycle until stopped.
///
/// Spawned by [`ChatClient::start`](crate::client::ChatClient::start);
/// never returns an error. Connection failures are absorbed into the
/// retry cycle, and the final act is always publishing `Disconnected`.
pub(crate) async fn run(ctx: SessionContext, mut command_rx: mpsc::UnboundedReceiver<Command>) {
    debug!(endpoint = %ctx.endpoint, "Session loop started");

    'session: loop {
        // ---- Connecting ----
        ctx.publish(ConnectionState::Connecting);
        let epoch = ConnectionEpoch::next();
        debug!(epoch = %epoch, endpoint = %ctx.endpoint, "Dialing");

        let open = Transport::open(&ctx.endpoint);
        tokio::pin!(open);

        let dialed = loop {
            tokio::select! {
                result = &mut open => break result,

                command = command_rx.recv() => match command {
                    Some(Command::Send(line)) => ctx.stash(line),
                    Some(Command::Reconnect) => {
                        trace!("Reconnect requested while already connecting");
                    }
                    Some(Command::Stop) | None => break 'session,
                }
            }
        };

        let mut transport = match dialed {
            Ok(transport) => transport,
            Err(e) => {
                warn!(epoch = %epoch, error = %e, "Connection attempt failed");
                match ctx.reconnect_window(&mut command_rx).await {
                    Next::Retry => continue 'session,
                    Next::Shutdown => break 'session,
                }
            }
        };

        // ---- Open ----
        info!(epoch = %epoch, "Connected");
        ctx.publish(ConnectionState::Open);

        if !ctx.flush_pending(&mut transport).await {
            warn!(epoch = %epoch, "Connection lost while flushing queued messages");
            match ctx.reconnect_window(&mut command_rx).await {
                Next::Retry => continue 'session,
                Next::Shutdown => break 'session,
            }
        }

        let lost_reason = loop {
            tokio::select! {
                event = transport.next_event() => match event {
                    TransportEvent::Received(text) => {
                        let message = ctx.transcript.append(Role::System, text);
                        trace!(id = %message.id, "Inbound message appended");
                    }
                    TransportEvent::Closed { reason } => {
                        break reason.unwrap_or_else(|| String::from("closed by remote"));
                    }
                    TransportEvent::Errored { error } => break error.to_string(),
                },

                command = command_rx.recv() => match command {
                    Some(Command::Send(line)) => {
                        if let Err(e) = transport.send_text(&line.text).await {
                            // Keep the line; it goes out on the next connection.
                            ctx.stash(line);
                            break format!("send failed: {e}");
                        }
                        trace!(id = %line.id, "Message sent");
                    }
                    Some(Command::Reconnect) => {
                        trace!("Reconnect requested while open, ignoring");
                    }
                    Some(Command::Stop) | None => {
                        ctx.publish(ConnectionState::Closing);
                        if let Err(e) = transport.close().await {
                            debug!(error = %e, "Error closing WebSocket during stop");
                        }
                        break 'session;
                    }
                }
            }
        };

        warn!(epoch = %epoch, reason = %lost_reason, "Connection lost");
        match ctx.reconnect_window(&mut command_rx).await {
            Next::Retry => continue 'session,
            Next::Shutdown => break 'session,
        }
    }

    ctx.publish(ConnectionState::Disconnected);
    debug!("Session loop terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::net::SocketAddr;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{WebSocketStream, accept_async};

    use crate::client::{ChatClient, ConnectionState, SendPolicy};
    use crate::error::Error;
    use crate::transcript::Role;

    use super::MAX_PENDING_LINES;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);
    const FAST_RETRY: Duration = Duration::from_millis(25);

    // ------------------------------------------------------------------
    // Harness
    // ------------------------------------------------------------------

    /// WebSocket peer with manual accept, so tests decide exactly when a
    /// dial is allowed to complete.
    struct TestServer {
        listener: TcpListener,
    }

    impl TestServer {
        async fn bind() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            Self { listener }
        }

        async fn rebind(addr: SocketAddr) -> Self {
            let listener = TcpListener::bind(addr).await.unwrap();
            Self { listener }
        }

        fn addr(&self) -> SocketAddr {
            self.listener.local_addr().unwrap()
        }

        fn endpoint(&self) -> String {
            format!("ws://{}/ws", self.addr())
        }

        async fn accept(&self) -> ServerConn {
            let (stream, _) = self.listener.accept().await.unwrap();
            let ws = accept_async(stream).await.unwrap();
            ServerConn { ws }
        }
    }

    struct ServerConn {
        ws: WebSocketStream<TcpStream>,
    }

    impl ServerConn {
        /// Next text frame, or `None` once the peer is gone.
        async fn recv_text(&mut self) -> Option<String> {
            while let Some(frame) = self.ws.next().await {
                match frame {
                    Ok(Message::Text(text)) => return Some(text.as_str().to_owned()),
                    Ok(Message::Close(_)) | Err(_) => return None,
                    _ => {}
                }
            }
            None
        }

        async fn send_text(&mut self, text: &str) {
            self.ws.send(Message::Text(text.into())).await.unwrap();
        }

        async fn close(mut self) {
            let _ = self.ws.close(None).await;
        }
    }

    async fn within<F: Future>(fut: F) -> F::Output {
        timeout(TEST_TIMEOUT, fut).await.expect("test timed out")
    }

    fn client_for(server: &TestServer) -> ChatClient {
        ChatClient::builder()
            .endpoint(server.endpoint())
            .reconnect_delay(FAST_RETRY)
            .no_greeting()
            .build()
            .unwrap()
    }

    async fn wait_for_state(client: &ChatClient, want: ConnectionState) {
        let mut states = client.state_changes();
        let observed = timeout(TEST_TIMEOUT, async {
            loop {
                if *states.borrow_and_update() == want {
                    return;
                }
                states.changed().await.unwrap();
            }
        })
        .await;
        assert!(observed.is_ok(), "timed out waiting for state {want}");
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_start_reaches_open() {
        let server = TestServer::bind().await;
        let client = client_for(&server);

        client.start().unwrap();
        let _conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        client.stop().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let server = TestServer::bind().await;
        let client = client_for(&server);

        client.start().unwrap();
        let _conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        // A second start must not spawn a second session.
        client.start().unwrap();
        assert!(
            timeout(Duration::from_millis(200), server.accept())
                .await
                .is_err()
        );
        assert_eq!(client.connection_state(), ConnectionState::Open);

        client.stop().await;
    }

    #[tokio::test]
    async fn test_send_echoes_then_delivers() {
        let server = TestServer::bind().await;
        let client = client_for(&server);

        client.start().unwrap();
        let mut conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        let id = client.send("hello").unwrap();
        assert_eq!(id.value(), 1);

        assert_eq!(within(conn.recv_text()).await.as_deref(), Some("hello"));

        let snapshot = client.transcript().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].role, Role::User);
        assert_eq!(snapshot[0].content, "hello");

        client.stop().await;
    }

    #[tokio::test]
    async fn test_inbound_messages_append_in_order() {
        let server = TestServer::bind().await;
        let client = client_for(&server);

        client.start().unwrap();
        let mut conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        let lines = ["oh, hi", "how can I help?", "anything else?", "no rush", "take care"];
        let mut revisions = client.transcript_revisions();
        for line in lines {
            conn.send_text(line).await;
        }

        within(async {
            while client.transcript().len() < lines.len() {
                revisions.changed().await.unwrap();
            }
        })
        .await;

        let snapshot = client.transcript().snapshot();
        let contents: Vec<&str> = snapshot.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, lines);
        for (index, message) in snapshot.iter().enumerate() {
            assert_eq!(message.role, Role::System);
            assert_eq!(message.id.value(), index as u64 + 1);
        }

        client.stop().await;
    }

    #[tokio::test]
    async fn test_send_rejected_when_not_open() {
        // The server never accepts, so the handshake stays pending and the
        // client sits in Connecting.
        let server = TestServer::bind().await;
        let client = client_for(&server);

        client.start().unwrap();
        wait_for_state(&client, ConnectionState::Connecting).await;

        match client.send("too early") {
            Err(Error::NotConnected { state }) => {
                assert_eq!(state, ConnectionState::Connecting);
            }
            other => panic!("Expected NotConnected, got {other:?}"),
        }
        assert!(client.transcript().is_empty());

        client.stop().await;
    }

    #[tokio::test]
    async fn test_send_before_start_is_stopped_error() {
        let server = TestServer::bind().await;
        let client = client_for(&server);

        assert!(matches!(client.send("anyone there?"), Err(Error::Stopped)));
        assert!(matches!(client.reconnect(), Err(Error::Stopped)));
    }

    #[tokio::test]
    async fn test_enqueue_flushes_in_order_after_open() {
        let server = TestServer::bind().await;
        let client = ChatClient::builder()
            .endpoint(server.endpoint())
            .reconnect_delay(FAST_RETRY)
            .send_policy(SendPolicy::Enqueue)
            .no_greeting()
            .build()
            .unwrap();

        client.start().unwrap();

        // Accepted while the handshake is still pending.
        let first = client.send("one").unwrap();
        let second = client.send("two").unwrap();
        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);

        within(async {
            while client.pending_count() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        let mut conn = within(server.accept()).await;
        assert_eq!(within(conn.recv_text()).await.as_deref(), Some("one"));
        assert_eq!(within(conn.recv_text()).await.as_deref(), Some("two"));

        within(async {
            while client.pending_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        client.stop().await;
    }

    #[tokio::test]
    async fn test_queued_while_disconnected_delivered_after_reconnect() {
        let server = TestServer::bind().await;
        let client = ChatClient::builder()
            .endpoint(server.endpoint())
            .reconnect_delay(Duration::from_millis(300))
            .send_policy(SendPolicy::Enqueue)
            .no_greeting()
            .build()
            .unwrap();

        client.start().unwrap();
        let conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        conn.close().await;
        wait_for_state(&client, ConnectionState::Disconnected).await;

        // Accepted while offline; echoed now, delivered after reconnect.
        client.send("catch you later").unwrap();
        assert_eq!(client.transcript().len(), 1);

        let mut conn = within(server.accept()).await;
        assert_eq!(
            within(conn.recv_text()).await.as_deref(),
            Some("catch you later")
        );

        client.stop().await;
    }

    #[tokio::test]
    async fn test_enqueue_refuses_past_queue_cap() {
        // A dead endpoint: dials fail instantly, and accepted sends pile
        // up in the pending queue.
        let server = TestServer::bind().await;
        let endpoint = server.endpoint();
        drop(server);

        let client = ChatClient::builder()
            .endpoint(endpoint)
            .reconnect_delay(Duration::from_secs(60))
            .send_policy(SendPolicy::Enqueue)
            .no_greeting()
            .build()
            .unwrap();

        client.start().unwrap();
        for i in 0..MAX_PENDING_LINES {
            client.send(format!("line {i}")).unwrap();
        }
        within(async {
            while client.pending_count() < MAX_PENDING_LINES {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        match client.send("one too many") {
            Err(Error::QueueFull { pending, limit }) => {
                assert_eq!(pending, MAX_PENDING_LINES);
                assert_eq!(limit, MAX_PENDING_LINES);
            }
            other => panic!("Expected QueueFull, got {other:?}"),
        }
        // The refused send left no echo behind.
        assert_eq!(client.transcript().len(), MAX_PENDING_LINES);

        client.stop().await;
    }

    #[tokio::test]
    async fn test_queue_capacity_frees_after_flush() {
        let server = TestServer::bind().await;
        let client = ChatClient::builder()
            .endpoint(server.endpoint())
            .reconnect_delay(FAST_RETRY)
            .send_policy(SendPolicy::Enqueue)
            .no_greeting()
            .build()
            .unwrap();

        // Fill to the cap while the handshake is still pending.
        client.start().unwrap();
        for i in 0..MAX_PENDING_LINES {
            client.send(format!("line {i}")).unwrap();
        }
        within(async {
            while client.pending_count() < MAX_PENDING_LINES {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(matches!(
            client.send("over the cap"),
            Err(Error::QueueFull { .. })
        ));

        // Opening the connection drains the queue and reopens acceptance.
        let mut conn = within(server.accept()).await;
        for i in 0..MAX_PENDING_LINES {
            let expected = format!("line {i}");
            assert_eq!(
                within(conn.recv_text()).await.as_deref(),
                Some(expected.as_str())
            );
        }
        within(async {
            while client.pending_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        client.send("after the flush").unwrap();
        assert_eq!(
            within(conn.recv_text()).await.as_deref(),
            Some("after the flush")
        );

        client.stop().await;
    }

    #[tokio::test]
    async fn test_reconnects_after_connection_drop() {
        let server = TestServer::bind().await;
        let client = client_for(&server);

        client.start().unwrap();
        let mut conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        client.send("alpha").unwrap();
        assert_eq!(within(conn.recv_text()).await.as_deref(), Some("alpha"));

        conn.close().await;

        // A new dial arrives without any caller involvement.
        let _conn2 = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        // One loss, one dial: no further attempt while this one is open.
        assert!(
            timeout(Duration::from_millis(200), server.accept())
                .await
                .is_err()
        );

        // The transcript survives the reconnect.
        let snapshot = client.transcript().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "alpha");

        client.stop().await;
    }

    #[tokio::test]
    async fn test_disconnected_published_while_waiting_to_reconnect() {
        let server = TestServer::bind().await;
        let client = ChatClient::builder()
            .endpoint(server.endpoint())
            .reconnect_delay(Duration::from_millis(500))
            .no_greeting()
            .build()
            .unwrap();

        client.start().unwrap();
        let conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        conn.close().await;
        wait_for_state(&client, ConnectionState::Disconnected).await;

        // And the cycle completes back to Open after the delay.
        let _conn2 = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        client.stop().await;
    }

    #[tokio::test]
    async fn test_stop_suppresses_reconnect() {
        let server = TestServer::bind().await;
        let client = client_for(&server);

        client.start().unwrap();
        let _conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        client.stop().await;
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);

        // With a 25ms retry delay, a leaked timer would redial well within
        // this window.
        assert!(
            timeout(Duration::from_millis(200), server.accept())
                .await
                .is_err()
        );

        assert!(matches!(client.send("hello?"), Err(Error::Stopped)));
    }

    #[tokio::test]
    async fn test_stop_during_reconnect_delay_returns_promptly() {
        // A dead endpoint: dials fail instantly, leaving the loop parked
        // in its delay phase almost permanently.
        let server = TestServer::bind().await;
        let endpoint = server.endpoint();
        drop(server);

        let client = ChatClient::builder()
            .endpoint(endpoint)
            .reconnect_delay(Duration::from_secs(60))
            .no_greeting()
            .build()
            .unwrap();

        client.start().unwrap();
        wait_for_state(&client, ConnectionState::Disconnected).await;

        // Must interrupt the 60s timer, not wait it out.
        within(client.stop()).await;
    }

    #[tokio::test]
    async fn test_reconnect_skips_delay() {
        let server = TestServer::bind().await;
        let addr = server.addr();
        let endpoint = server.endpoint();
        drop(server);

        let client = ChatClient::builder()
            .endpoint(endpoint)
            .reconnect_delay(Duration::from_secs(60))
            .no_greeting()
            .build()
            .unwrap();

        client.start().unwrap();
        wait_for_state(&client, ConnectionState::Disconnected).await;

        // Bring the endpoint back and ask for an immediate retry.
        let server = TestServer::rebind(addr).await;
        client.reconnect().unwrap();

        let _conn = within(server.accept()).await;
        wait_for_state(&client, ConnectionState::Open).await;

        client.stop().await;
    }
}

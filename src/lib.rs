//! Chatline - Resilient chat connection manager.
//!
//! This library keeps one WebSocket conversation alive for a chat UI:
//! it dials, reconnects after failures, and maintains the transcript
//! the UI renders from.
//!
//! # Architecture
//!
//! The client follows a handle-and-loop model:
//!
//! - **Handle ([`ChatClient`])**: Cheap to clone; accepts sends, exposes
//!   state and transcript
//! - **Session loop**: One spawned task that owns the connection and is
//!   the only writer of connection state
//!
//! Key design principles:
//!
//! - Every connection mutation runs on the session loop (no races)
//! - The transcript is append-only and survives reconnects
//! - Sends never block; acceptance is decided synchronously
//! - Reconnection is automatic, after a fixed configurable delay
//!
//! # Quick Start
//!
//! ```no_run
//! use chatline::{ChatClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Build a client for the chat backend
//!     let client = ChatClient::builder()
//!         .endpoint("ws://127.0.0.1:8080/ws")
//!         .build()?;
//!
//!     // Start dialing; the loop reconnects on its own from here
//!     client.start()?;
//!
//!     // Render on every transcript change
//!     let mut revisions = client.transcript_revisions();
//!     while revisions.changed().await.is_ok() {
//!         for message in client.transcript().snapshot() {
//!             println!("[{}] {}", message.role, message.content);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Connection manager: [`ChatClient`], builder, options |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`transcript`] | Append-only conversation record |
//! | [`transport`] | WebSocket transport layer (internal) |
//!
//! # Features
//!
//! - **Self-healing**: Lost connections redial after a fixed delay
//! - **Ordered**: Transcript ids are dense and append order is render order
//! - **Non-blocking**: Send acceptance never waits on the network
//! - **Observable**: Watch channels publish state and transcript changes

// ============================================================================
// Modules
// ============================================================================

/// Connection manager: client handle, builder, options, session loop.
///
/// Use [`ChatClient::builder()`] to create a configured client instance.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for messages and connection attempts.
///
/// Newtypes keep message ids and connection epochs from mixing.
pub mod identifiers;

/// Append-only conversation record.
///
/// The [`Transcript`] orders messages and notifies observers as it grows.
pub mod transcript;

/// WebSocket transport layer.
///
/// Internal module handling dialing and frame-to-event mapping.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    ChatClient, ClientBuilder, ClientOptions, ConnectionState, DEFAULT_GREETING,
    DEFAULT_RECONNECT_DELAY, SendPolicy,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionEpoch, MessageId};

// Transcript types
pub use transcript::{Message, Role, Transcript, TranscriptView};

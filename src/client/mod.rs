//! Chat client module.
//!
//! This module provides the connection manager: the UI-facing handle, its
//! configuration, and the session loop that owns the connection.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatClient`] | Handle for one conversation |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Reconnect and send-policy options |
//! | [`SendPolicy`] | What to do with sends while offline |
//! | [`ConnectionState`] | Published connection status |
//!
//! # Lifecycle
//!
//! ```text
//!          start / delay elapsed
//! Disconnected ──────────► Connecting ──────► Open
//!      ▲                       │               │
//!      │      dial failed      │               │ connection lost
//!      ├───────────────────────┘               │
//!      │                                       │
//!      ◄───────────────────────────────────────┤
//!      │                                       │ stop()
//!      ◄────────────── Closing ◄───────────────┘
//! ```
//!
//! Reconnection is automatic: after a failed dial or a lost connection
//! the client waits [`ClientOptions::reconnect_delay`] and dials again,
//! indefinitely, until stopped.
//!
//! # Example
//!
//! ```no_run
//! use chatline::{ChatClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = ChatClient::builder()
//!     .endpoint("ws://127.0.0.1:8080/ws")
//!     .build()?;
//!
//! client.start()?;
//!
//! let mut revisions = client.transcript_revisions();
//! while revisions.changed().await.is_ok() {
//!     for message in client.transcript().snapshot() {
//!         println!("[{}] {}", message.role, message.content);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

/// Client behavior options.
pub mod options;

/// Session loop driving the connection.
mod session;

/// Connection state published to observers.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::ChatClient;
pub use options::{ClientOptions, DEFAULT_GREETING, DEFAULT_RECONNECT_DELAY, SendPolicy};
pub use state::ConnectionState;

//! WebSocket transport layer.
//!
//! This module handles communication between the local end (client) and
//! the remote end (chat backend) via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  ChatClient     │                              │  Chat Backend   │
//! │                 │         WebSocket            │                 │
//! │  session loop   │◄────────────────────────────►│  WebSocket      │
//! │  → Transport    │      ws://host:port/...      │  Server         │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::open` - Dial the endpoint and complete the handshake
//! 2. `Transport::send_text` / `Transport::next_event` - Exchange text frames
//! 3. `Transport::close` - Send a close frame and tear the socket down
//!
//! One [`Transport`] value represents one connection attempt. After a
//! [`TransportEvent::Closed`] or [`TransportEvent::Errored`] the value is
//! spent; reconnection means opening a fresh one.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `socket` | WebSocket dialing and frame-to-event mapping |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket dialing and frame-to-event mapping.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use socket::{Transport, TransportEvent};

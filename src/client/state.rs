//! Connection state published to observers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the connection currently stands.
///
/// Published through [`ChatClient::state_changes`] so UI layers can show a
/// status indicator. Serializes in lowercase (`"open"`, `"connecting"`),
/// matching the wire casing of transcript roles.
///
/// # Transitions
///
/// ```text
///          start / delay elapsed
/// Disconnected ──────────► Connecting ──────► Open
///      ▲                       │               │
///      │      dial failed      │               │ connection lost
///      ├───────────────────────┘               │
///      │                                       │
///      ◄───────────────────────────────────────┤
///      │                                       │ stop()
///      ◄────────────── Closing ◄───────────────┘
/// ```
///
/// [`ChatClient::state_changes`]: crate::client::ChatClient::state_changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection, and no dial in progress. The reconnect timer may be
    /// running.
    #[default]
    Disconnected,
    /// A dial is in progress.
    Connecting,
    /// The connection is established; sends go straight to the wire.
    Open,
    /// A stop is in progress; the close handshake is being performed.
    Closing,
}

impl ConnectionState {
    /// Returns `true` if sends would go straight to the wire.
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

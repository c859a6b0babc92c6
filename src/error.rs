//! Error types for the chat connection manager.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chatline::{ChatClient, Result};
//!
//! fn example(client: &ChatClient) -> Result<()> {
//!     client.send("hello")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidEndpoint`] |
//! | Connection | [`Error::Connect`], [`Error::ConnectionLost`] |
//! | Send | [`Error::NotConnected`], [`Error::QueueFull`], [`Error::Stopped`] |
//! | External | [`Error::WebSocket`] |
//!
//! Connection-category errors never reach callers of the client API: the
//! session loop absorbs them into state transitions and retries. Only the
//! send-category and configuration-category variants are caller-visible.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::client::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is incomplete or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint URL is not usable.
    ///
    /// Returned when the endpoint fails to parse or uses a scheme other
    /// than `ws` / `wss`.
    #[error("Invalid endpoint '{url}': {message}")]
    InvalidEndpoint {
        /// The offending endpoint string.
        url: String,
        /// Description of what is wrong with it.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection attempt failed outright.
    ///
    /// Raised by the transport when a dial never reaches the open state.
    /// Absorbed by the session loop, never surfaced to callers.
    #[error("Connection failed: {message}")]
    Connect {
        /// Description of the connection failure.
        message: String,
    },

    /// Connection dropped after having been open.
    ///
    /// Raised by the transport when an established connection is lost.
    /// Absorbed by the session loop, never surfaced to callers.
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// Close reason, or a description of the underlying failure.
        reason: String,
    },

    // ========================================================================
    // Send Errors
    // ========================================================================
    /// A send was attempted outside the `Open` state.
    ///
    /// Only produced under [`SendPolicy::Reject`](crate::client::SendPolicy);
    /// the queueing policy accepts sends in any running state.
    #[error("Cannot send while {state}")]
    NotConnected {
        /// Connection state observed at the time of the call.
        state: ConnectionState,
    },

    /// The pending queue is at capacity.
    ///
    /// Too many accepted messages are already waiting for a connection.
    /// The queue drains whenever the connection opens, so a later retry
    /// can succeed.
    #[error("Pending queue is full: {pending}/{limit}")]
    QueueFull {
        /// Messages waiting when the send was refused.
        pending: usize,
        /// Hard capacity of the pending queue.
        limit: usize,
    },

    /// The client has not been started, or has been stopped.
    ///
    /// Unlike [`Error::NotConnected`] there is no session loop running, so
    /// an accepted send could never be flushed.
    #[error("Client is not running")]
    Stopped,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid endpoint error.
    #[inline]
    pub fn invalid_endpoint(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Creates a connection lost error.
    #[inline]
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            reason: reason.into(),
        }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(state: ConnectionState) -> Self {
        Self::NotConnected { state }
    }

    /// Creates a queue full error.
    #[inline]
    pub fn queue_full(pending: usize, limit: usize) -> Self {
        Self::QueueFull { pending, limit }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::ConnectionLost { .. } | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on a later retry: the session loop
    /// redials connection errors automatically, and send refusals clear
    /// once a connection opens.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::ConnectionLost { .. }
                | Self::NotConnected { .. }
                | Self::QueueFull { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

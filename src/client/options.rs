//! Client behavior options.
//!
//! Provides a type-safe interface for configuring how a client reconnects
//! and what it does with sends attempted while offline.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use chatline::{ClientOptions, SendPolicy};
//!
//! let options = ClientOptions::new()
//!     .with_reconnect_delay(Duration::from_millis(250))
//!     .with_send_policy(SendPolicy::Enqueue)
//!     .without_greeting();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Delay between losing a connection and the next dial.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Greeting seeded into a fresh transcript as message 1.
pub const DEFAULT_GREETING: &str = "Welcome! How can I assist you today?";

// ============================================================================
// SendPolicy
// ============================================================================

/// What [`ChatClient::send`] does when the connection is not open.
///
/// Either way the outcome is defined at the call site: a send never
/// silently disappears.
///
/// [`ChatClient::send`]: crate::client::ChatClient::send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendPolicy {
    /// Refuse the send with [`Error::NotConnected`]. The caller decides
    /// whether to retry, and the transcript is not touched.
    ///
    /// [`Error::NotConnected`]: crate::error::Error::NotConnected
    #[default]
    Reject,
    /// Accept the send: echo it into the transcript immediately and queue
    /// it for transmission. Queued messages are flushed in order the next
    /// time the connection opens. The queue is bounded; at capacity,
    /// further sends fail with [`Error::QueueFull`].
    ///
    /// [`Error::QueueFull`]: crate::error::Error::QueueFull
    Enqueue,
}

// ============================================================================
// ClientOptions
// ============================================================================

/// Client behavior configuration.
///
/// Controls reconnection timing, offline send handling, and the seeded
/// greeting. The endpoint itself is set on
/// [`ClientBuilder`](crate::client::ClientBuilder), not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Time to wait after a lost connection or failed dial before trying
    /// again.
    pub reconnect_delay: Duration,

    /// Behavior of sends attempted while the connection is not open.
    pub send_policy: SendPolicy,

    /// System message seeded as the first transcript entry, or `None` for
    /// an empty transcript.
    pub greeting: Option<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            send_policy: SendPolicy::default(),
            greeting: Some(DEFAULT_GREETING.to_owned()),
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the offline send policy.
    #[inline]
    #[must_use]
    pub fn with_send_policy(mut self, policy: SendPolicy) -> Self {
        self.send_policy = policy;
        self
    }

    /// Sets the greeting seeded into a fresh transcript.
    #[inline]
    #[must_use]
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Starts the transcript empty, with no seeded greeting.
    #[inline]
    #[must_use]
    pub fn without_greeting(mut self) -> Self {
        self.greeting = None;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new();
        assert_eq!(options.reconnect_delay, Duration::from_millis(1000));
        assert_eq!(options.send_policy, SendPolicy::Reject);
        assert_eq!(options.greeting.as_deref(), Some(DEFAULT_GREETING));
    }

    #[test]
    fn test_default_matches_new() {
        assert_eq!(ClientOptions::default(), ClientOptions::new());
    }

    #[test]
    fn test_with_reconnect_delay() {
        let options = ClientOptions::new().with_reconnect_delay(Duration::from_millis(250));
        assert_eq!(options.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_with_send_policy() {
        let options = ClientOptions::new().with_send_policy(SendPolicy::Enqueue);
        assert_eq!(options.send_policy, SendPolicy::Enqueue);
    }

    #[test]
    fn test_greeting_overrides() {
        let custom = ClientOptions::new().with_greeting("hi there");
        assert_eq!(custom.greeting.as_deref(), Some("hi there"));

        let none = ClientOptions::new().without_greeting();
        assert!(none.greeting.is_none());
    }
}

//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`ChatClient`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use chatline::ChatClient;
//!
//! # fn example() -> chatline::Result<()> {
//! let client = ChatClient::builder()
//!     .endpoint("ws://127.0.0.1:8080/ws")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

use super::core::ChatClient;
use super::options::{ClientOptions, SendPolicy};

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`ChatClient`] instance.
///
/// Use [`ChatClient::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    /// WebSocket endpoint to dial.
    endpoint: Option<String>,
    /// Behavior options.
    options: ClientOptions,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new client builder with no endpoint configured.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: None,
            options: ClientOptions::new(),
        }
    }

    /// Sets the WebSocket endpoint to dial.
    ///
    /// # Arguments
    ///
    /// * `url` - Endpoint URL (e.g., "ws://127.0.0.1:8080/ws")
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the delay between losing a connection and the next dial.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.options.reconnect_delay = delay;
        self
    }

    /// Sets the behavior of sends attempted while not connected.
    #[inline]
    #[must_use]
    pub fn send_policy(mut self, policy: SendPolicy) -> Self {
        self.options.send_policy = policy;
        self
    }

    /// Sets the greeting seeded into the fresh transcript.
    #[inline]
    #[must_use]
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.options.greeting = Some(greeting.into());
        self
    }

    /// Starts the transcript empty, with no seeded greeting.
    #[inline]
    #[must_use]
    pub fn no_greeting(mut self) -> Self {
        self.options.greeting = None;
        self
    }

    /// Replaces the whole option set at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the client with validation.
    ///
    /// The client starts with no connection; call
    /// [`ChatClient::start`] to begin dialing.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no endpoint was set
    /// - [`Error::InvalidEndpoint`] if the endpoint fails to parse or uses
    ///   a scheme other than `ws` / `wss`
    pub fn build(self) -> Result<ChatClient> {
        let endpoint = self.validate_endpoint()?;
        Ok(ChatClient::new(endpoint, self.options))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the endpoint configuration.
    fn validate_endpoint(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().ok_or_else(|| {
            Error::config(
                "Endpoint is required. Use .endpoint() to set it.\n\
                 Example: ChatClient::builder().endpoint(\"ws://127.0.0.1:8080/ws\")",
            )
        })?;

        let url =
            Url::parse(raw).map_err(|e| Error::invalid_endpoint(raw, e.to_string()))?;

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(Error::invalid_endpoint(
                raw,
                format!("scheme must be ws or wss, got '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

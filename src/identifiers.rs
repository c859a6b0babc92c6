//! Identifier types used throughout the crate.
//!
//! Two identifier families exist:
//!
//! | Type | Assigned by | Purpose |
//! |------|-------------|---------|
//! | [`MessageId`] | [`Transcript`](crate::transcript::Transcript) | Orders messages within a transcript |
//! | [`ConnectionEpoch`] | [session loop](crate::client::ChatClient) | Correlates log lines per connection attempt |
//!
//! Both are plain `u64` newtypes. [`MessageId`] values start at `1` and are
//! dense within a single transcript. [`ConnectionEpoch`] values are unique
//! for the lifetime of the process but carry no meaning beyond identity.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// MessageId
// ============================================================================

/// Identifier of a single message within a transcript.
///
/// Serializes as a bare integer, so a message renders as
/// `{"id": 1, "role": "user", "content": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    /// Creates a message id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ConnectionEpoch
// ============================================================================

/// Identifier of one connection attempt.
///
/// The session loop draws a fresh epoch before each dial and threads it
/// through its log lines, so the lines belonging to one attempt can be
/// grepped out of interleaved output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionEpoch(u64);

impl ConnectionEpoch {
    /// Generates the next epoch in process-wide sequence.
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

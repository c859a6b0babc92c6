//! Append-only conversation transcript.
//!
//! The transcript is the single owned record of the conversation. The
//! session loop appends inbound lines, [`ChatClient::send`] appends the
//! local echo, and UI layers render through a read-only
//! [`TranscriptView`].
//!
//! # Guarantees
//!
//! - Append-only: messages are never mutated, reordered, or removed.
//! - Dense ids: the first message gets id `1`, each append increments by 1.
//! - Snapshot order is append order.
//!
//! Handles are cheap to clone and share one underlying log. A revision
//! counter is published through a watch channel so observers can re-render
//! only when the log actually grew:
//!
//! ```ignore
//! let mut revisions = client.transcript_revisions();
//! while revisions.changed().await.is_ok() {
//!     render(&client.transcript().snapshot());
//! }
//! ```
//!
//! [`ChatClient::send`]: crate::client::ChatClient::send

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::identifiers::MessageId;

// ============================================================================
// Role
// ============================================================================

/// Originator of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed locally and echoed into the transcript at send time.
    User,
    /// Produced by the remote peer, or seeded by the client itself.
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// One line of conversation.
///
/// Serializes as `{"id": 1, "role": "user", "content": "hello"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Position of this message within its transcript, starting at 1.
    pub id: MessageId,
    /// Who produced the message.
    pub role: Role,
    /// The message text, unparsed.
    pub content: String,
}

// ============================================================================
// Transcript
// ============================================================================

/// Shared handle to an append-only message log.
#[derive(Debug, Clone)]
pub struct Transcript {
    inner: Arc<TranscriptInner>,
}

#[derive(Debug)]
struct TranscriptInner {
    log: Mutex<TranscriptLog>,
    revision_tx: watch::Sender<u64>,
}

#[derive(Debug)]
struct TranscriptLog {
    entries: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(TranscriptInner {
                log: Mutex::new(TranscriptLog {
                    entries: Vec::new(),
                    next_id: 1,
                }),
                revision_tx,
            }),
        }
    }

    /// Appends a message, assigning it the next id.
    ///
    /// Returns the stored message including its assigned id. Observers of
    /// [`Transcript::revisions`] are notified before this call returns.
    pub fn append(&self, role: Role, content: impl Into<String>) -> Message {
        let mut log = self.inner.log.lock();
        let message = Message {
            id: MessageId::new(log.next_id),
            role,
            content: content.into(),
        };
        log.next_id += 1;
        log.entries.push(message.clone());
        // Publish under the lock so revisions never run backwards.
        self.inner.revision_tx.send_replace(log.entries.len() as u64);
        message
    }

    /// Returns a copy of every message, in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.inner.log.lock().entries.clone()
    }

    /// Returns the most recently appended message, if any.
    #[must_use]
    pub fn last(&self) -> Option<Message> {
        self.inner.log.lock().entries.last().cloned()
    }

    /// Returns the number of messages appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.log.lock().entries.len()
    }

    /// Returns `true` if no message has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to the revision counter.
    ///
    /// The counter equals [`Transcript::len`] after each append. A fresh
    /// receiver marks the current value as seen, so only future appends
    /// wake `changed()`.
    #[must_use]
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision_tx.subscribe()
    }

    /// Returns a read-only view of this log.
    ///
    /// The view is live: appends made after this call are visible through
    /// it. Hand views to code that renders but must not write.
    #[must_use]
    pub fn view(&self) -> TranscriptView {
        TranscriptView {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TranscriptView
// ============================================================================

/// Read-only view of a [`Transcript`].
///
/// A view observes the same live log as the transcript it came from:
/// snapshots, length checks and revision subscriptions all work, but
/// there is no append. [`ChatClient::transcript`] hands these out so
/// every message keeps entering the log through the client and its
/// session loop.
///
/// [`ChatClient::transcript`]: crate::client::ChatClient::transcript
#[derive(Debug, Clone)]
pub struct TranscriptView {
    inner: Arc<TranscriptInner>,
}

impl TranscriptView {
    /// Returns a copy of every message, in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.inner.log.lock().entries.clone()
    }

    /// Returns the most recently appended message, if any.
    #[must_use]
    pub fn last(&self) -> Option<Message> {
        self.inner.log.lock().entries.last().cloned()
    }

    /// Returns the number of messages appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.log.lock().entries.len()
    }

    /// Returns `true` if no message has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to the revision counter.
    ///
    /// See [`Transcript::revisions`].
    #[must_use]
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision_tx.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================

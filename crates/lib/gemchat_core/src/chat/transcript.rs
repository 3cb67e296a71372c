//! In-memory transcript.

use serde::Serialize;

use crate::models::message::{Role, StoredMessage};

/// Whether a displayed entry is known to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    /// Shown optimistically, write not yet acknowledged.
    Pending,
    /// Present in the store.
    Confirmed,
    /// The write (or the relay call producing it) failed; not in the store.
    Failed,
}

/// One displayed chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub state: DeliveryState,
}

/// Ordered sequence of displayed entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transcript of confirmed entries from stored rows, keeping their order.
    pub fn from_stored(messages: Vec<StoredMessage>) -> Self {
        let entries = messages
            .into_iter()
            .map(|m| TranscriptEntry {
                role: m.role,
                content: m.content,
                state: DeliveryState::Confirmed,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a pending entry and return its index.
    pub fn push_pending(&mut self, role: Role, content: impl Into<String>) -> usize {
        self.entries.push(TranscriptEntry {
            role,
            content: content.into(),
            state: DeliveryState::Pending,
        });
        self.entries.len() - 1
    }

    pub fn confirm(&mut self, index: usize) {
        self.set_state(index, DeliveryState::Confirmed);
    }

    pub fn fail(&mut self, index: usize) {
        self.set_state(index, DeliveryState::Failed);
    }

    /// Entries that are not in the store.
    pub fn unsaved(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries
            .iter()
            .filter(|e| e.state != DeliveryState::Confirmed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn set_state(&mut self, index: usize, state: DeliveryState) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.state = state;
        }
    }
}

//! Chat page model.
//!
//! Holds the transcript shown to one identity and drives the turn cycle:
//! load history, send a prompt (persist → relay → persist), clear. Storage and
//! the model relay are collaborators behind [`MessageStore`] and [`Relay`] so
//! the same page runs server-side against Postgres and Gemini, and in the CLI
//! against the HTTP API.

pub mod page;
pub mod transcript;


use async_trait::async_trait;
use thiserror::Error;

use crate::models::message::{Role, StoredMessage};

pub use page::{ChatPage, PageView, SendOutcome};
pub use transcript::{DeliveryState, Transcript, TranscriptEntry};

/// Message storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// The relay could not produce a reply.
#[derive(Debug, Error)]
#[error("Relay failed: {0}")]
pub struct RelayError(pub String);

/// Per-owner message storage.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All messages of `owner`, oldest first.
    async fn list(&self, owner: &str) -> Result<Vec<StoredMessage>, StoreError>;

    async fn insert(
        &self,
        owner: &str,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, StoreError>;

    /// Delete all messages of `owner`, returning how many were removed.
    async fn clear(&self, owner: &str) -> Result<u64, StoreError>;
}

/// Turns a prompt into a model reply.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn relay(&self, prompt: &str) -> Result<String, RelayError>;
}

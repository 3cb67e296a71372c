//! The chat page state machine: `{idle, sending}` plus the transcript.

use tracing::{debug, error, warn};

use super::transcript::{Transcript, TranscriptEntry};
use super::{MessageStore, Relay, StoreError};
use crate::gemini::ERROR_REPLY;
use crate::models::auth::Identity;
use crate::models::message::Role;

/// What the page should render.
#[derive(Debug, PartialEq, Eq)]
pub enum PageView<'a> {
    /// No identity: only a login prompt is shown.
    LoginPrompt,
    Chat {
        greeting: String,
        entries: &'a [TranscriptEntry],
        /// A send is in flight ("typing" indicator, send control disabled).
        loading: bool,
    },
}

/// Result of [`ChatPage::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, no identity, or a send already in flight. Nothing was called.
    Ignored,
    /// The relay answered; the flags say which writes reached the store.
    Completed { user_saved: bool, reply_saved: bool },
    /// The relay failed; the error entry is shown but not persisted.
    RelayFailed { user_saved: bool },
}

/// A turn between [`ChatPage::begin_send`] and [`ChatPage::finish_send`].
#[derive(Debug)]
struct InFlight {
    prompt: String,
    /// Transcript index of the pending user entry.
    entry: usize,
}

/// Chat page for one (possibly absent) identity.
#[derive(Debug, Default)]
pub struct ChatPage {
    identity: Option<Identity>,
    transcript: Transcript,
    input: String,
    in_flight: Option<InFlight>,
}

impl ChatPage {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Switch identity. A different identity drops the transcript; call
    /// [`ChatPage::load`] afterwards.
    pub fn set_identity(&mut self, identity: Option<Identity>) {
        if self.identity != identity {
            self.transcript.clear();
            self.in_flight = None;
            self.identity = identity;
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// A turn has begun and not finished yet.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn view(&self) -> PageView<'_> {
        match &self.identity {
            None => PageView::LoginPrompt,
            Some(identity) => PageView::Chat {
                greeting: format!("Hi, {}", identity.display_name()),
                entries: self.transcript.entries(),
                loading: self.is_loading(),
            },
        }
    }

    /// Replace the transcript with the identity's stored history.
    ///
    /// Without an identity this does nothing. On failure the error is logged,
    /// the transcript is left as it was, and the error is returned.
    pub async fn load<S>(&mut self, store: &S) -> Result<usize, StoreError>
    where
        S: MessageStore + ?Sized,
    {
        let Some(identity) = &self.identity else {
            return Ok(0);
        };
        match store.list(&identity.email).await {
            Ok(messages) => {
                self.transcript = Transcript::from_stored(messages);
                debug!(owner = %identity.email, count = self.transcript.len(), "loaded messages");
                Ok(self.transcript.len())
            }
            Err(e) => {
                error!(owner = %identity.email, error = %e, "error loading messages");
                Err(e)
            }
        }
    }

    /// Run one turn with the current input: [`begin_send`](Self::begin_send)
    /// followed by [`finish_send`](Self::finish_send).
    pub async fn send<S, R>(&mut self, store: &S, relay: &R) -> SendOutcome
    where
        S: MessageStore + ?Sized,
        R: Relay + ?Sized,
    {
        if !self.begin_send() {
            return SendOutcome::Ignored;
        }
        self.finish_send(store, relay).await
    }

    /// Start a turn: show the input as a pending user entry, clear the input
    /// and enter the loading state.
    ///
    /// Returns `false` without changing anything when there is no identity,
    /// the input is blank, or a turn is already in flight.
    pub fn begin_send(&mut self) -> bool {
        if self.identity.is_none() || self.in_flight.is_some() || self.input.trim().is_empty() {
            return false;
        }
        let prompt = std::mem::take(&mut self.input);
        let entry = self.transcript.push_pending(Role::User, prompt.clone());
        self.in_flight = Some(InFlight { prompt, entry });
        true
    }

    /// Complete the turn started by [`begin_send`](Self::begin_send): persist
    /// the prompt, relay it, persist the reply, leave the loading state.
    ///
    /// Without a turn in flight this does nothing.
    pub async fn finish_send<S, R>(&mut self, store: &S, relay: &R) -> SendOutcome
    where
        S: MessageStore + ?Sized,
        R: Relay + ?Sized,
    {
        let (Some(identity), Some(turn)) = (self.identity.clone(), self.in_flight.take()) else {
            return SendOutcome::Ignored;
        };
        let InFlight { prompt, entry } = turn;

        let user_saved = match store.insert(&identity.email, Role::User, &prompt).await {
            Ok(_) => {
                self.transcript.confirm(entry);
                true
            }
            Err(e) => {
                error!(owner = %identity.email, error = %e, "failed to save user message");
                self.transcript.fail(entry);
                false
            }
        };

        match relay.relay(&prompt).await {
            Ok(reply) => {
                let reply_entry = self.transcript.push_pending(Role::Assistant, reply.clone());
                let reply_saved = match store.insert(&identity.email, Role::Assistant, &reply).await
                {
                    Ok(_) => {
                        self.transcript.confirm(reply_entry);
                        true
                    }
                    Err(e) => {
                        error!(owner = %identity.email, error = %e, "failed to save reply");
                        self.transcript.fail(reply_entry);
                        false
                    }
                };
                SendOutcome::Completed {
                    user_saved,
                    reply_saved,
                }
            }
            Err(e) => {
                warn!(owner = %identity.email, error = %e, "relay failed");
                let reply_entry = self.transcript.push_pending(Role::Assistant, ERROR_REPLY);
                self.transcript.fail(reply_entry);
                SendOutcome::RelayFailed { user_saved }
            }
        }
    }

    /// Delete the identity's stored messages and empty the transcript.
    ///
    /// On failure the error is logged and the transcript is left unchanged,
    /// even if the store removed some rows.
    pub async fn clear<S>(&mut self, store: &S) -> Result<u64, StoreError>
    where
        S: MessageStore + ?Sized,
    {
        let Some(identity) = &self.identity else {
            return Ok(0);
        };
        match store.clear(&identity.email).await {
            Ok(removed) => {
                self.transcript.clear();
                debug!(owner = %identity.email, removed, "cleared messages");
                Ok(removed)
            }
            Err(e) => {
                error!(owner = %identity.email, error = %e, "failed to clear messages");
                Err(e)
            }
        }
    }
}

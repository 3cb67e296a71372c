//! # gemchat_core
//!
//! Core domain logic for Gemchat: message persistence, the Gemini relay
//! client, the chat page model, and authentication primitives.

pub mod auth;
pub mod chat;
pub mod db;
pub mod gemini;
pub mod ids;
pub mod messages;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}

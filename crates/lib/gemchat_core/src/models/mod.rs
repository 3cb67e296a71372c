//! Domain models shared by the API and the chat clients.

pub mod auth;
pub mod message;

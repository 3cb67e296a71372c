//! API server configuration.

use gemchat_core::gemini::GeminiConfig;

use crate::services::auth::resolve_jwt_secret;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Mark auth cookies `Secure` (set behind TLS).
    pub secure_cookies: bool,
    /// Upstream model settings.
    pub gemini: GeminiConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                     | Default                                  |
    /// |------------------------------|------------------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:3000`                         |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/gemchat`      |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file            |
    /// | `SECURE_COOKIES`             | `false`                                  |
    /// | `GEMINI_*`                   | see [`GeminiConfig::from_env`]           |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/gemchat".into()),
            jwt_secret: resolve_jwt_secret(),
            secure_cookies: std::env::var("SECURE_COOKIES")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            gemini: GeminiConfig::from_env(),
        }
    }
}

//! Gemini `generateContent` client.
//!
//! Sends one prompt as a single-turn request and extracts the first text part
//! of the first candidate. No history is sent, no retries are made, and the
//! transport's default timeouts apply.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::chat::{Relay, RelayError};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Reply used when the response carries no candidate text.
pub const FALLBACK_REPLY: &str = "No response from Gemini.";

/// Reply shown to the user when the relay fails.
pub const ERROR_REPLY: &str = "Error talking to Gemini API";

/// Errors from a Gemini call.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gemini response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Gemini connection settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Sent as the `key` query parameter. Not checked before use.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    /// Reads `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_BASE_URL`.
    pub fn from_env() -> Self {
        let non_empty = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty("GEMINI_API_KEY"),
            model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn single_turn(prompt: &'a str) -> Self {
        Self {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, or [`FALLBACK_REPLY`] when that
    /// path is missing or empty.
    fn into_reply(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string())
    }
}

/// Stateless Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Use a shared `reqwest::Client`.
    pub fn with_client(http: Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// `{base_url}/v1beta/models/{model}:generateContent`, without the key.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Send `prompt` as a single-turn request and return the reply text.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&GenerateContentRequest::single_turn(prompt))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(status = status.as_u16(), body = %body, "Gemini response");

        // An error status is a failure even when the body is JSON without
        // candidates; it is not turned into the "no response" fallback.
        if !status.is_success() {
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_reply())
    }
}

#[async_trait]
impl Relay for GeminiClient {
    async fn relay(&self, prompt: &str) -> Result<String, RelayError> {
        self.generate(prompt)
            .await
            .map_err(|e| RelayError(e.to_string()))
    }
}

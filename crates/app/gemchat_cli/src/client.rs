//! HTTP collaborators for the chat page: a [`MessageStore`] over
//! `/api/messages` and a [`Relay`] over `/api/ai`.
//!
//! The server derives the message owner from the bearer token, so the
//! `owner` argument of the store methods is only used to fill in rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gemchat_core::chat::{MessageStore, Relay, RelayError, StoreError};
use gemchat_core::models::auth::Identity;
use gemchat_core::models::message::{Role, StoredMessage};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    email: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDto {
    id: Uuid,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct MessageList {
    messages: Vec<MessageDto>,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct Cleared {
    deleted: u64,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct RelayResponse {
    reply: String,
}

impl MessageDto {
    fn into_stored(self, owner: &str) -> StoredMessage {
        StoredMessage {
            id: self.id,
            owner: owner.to_string(),
            role: self.role,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

/// Authenticated connection to a Gemchat server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl ApiClient {
    /// Log in with email + password and keep the access token.
    pub async fn login(base_url: &str, email: &str, password: &str) -> Result<(Self, Identity)> {
        let http = Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();
        let resp = http
            .post(format!("{base_url}/api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let tokens: TokenResponse = ok_json(resp).await?;
        log::debug!("logged in as {}", tokens.user.email);

        let identity = Identity {
            user_id: tokens.user.id,
            email: tokens.user.email,
            name: tokens.user.name,
        };
        let client = Self {
            http,
            base_url,
            access_token: tokens.access_token,
        };
        Ok((client, identity))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn list_messages(&self, owner: &str) -> Result<Vec<StoredMessage>> {
        let resp = self
            .http
            .get(self.url("/api/messages"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let list: MessageList = ok_json(resp).await?;
        Ok(list
            .messages
            .into_iter()
            .map(|m| m.into_stored(owner))
            .collect())
    }

    async fn create_message(
        &self,
        owner: &str,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage> {
        let resp = self
            .http
            .post(self.url("/api/messages"))
            .bearer_auth(&self.access_token)
            .json(&CreateMessage { role, content })
            .send()
            .await?;
        let created: MessageDto = ok_json(resp).await?;
        Ok(created.into_stored(owner))
    }

    async fn clear_messages(&self) -> Result<u64> {
        let resp = self
            .http
            .delete(self.url("/api/messages"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let cleared: Cleared = ok_json(resp).await?;
        Ok(cleared.deleted)
    }

    /// `POST /api/ai`. A non-2xx answer is an error even though it carries a reply.
    async fn ask(&self, prompt: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.url("/api/ai"))
            .json(&RelayRequest { message: prompt })
            .send()
            .await?;
        let status = resp.status();
        let body: RelayResponse = resp.json().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body.reply,
            });
        }
        Ok(body.reply)
    }
}

/// Decode a 2xx JSON body, or turn the server's `{error, message}` into [`Error::Api`].
async fn ok_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
    };
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

fn unavailable(e: Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl MessageStore for ApiClient {
    async fn list(&self, owner: &str) -> std::result::Result<Vec<StoredMessage>, StoreError> {
        self.list_messages(owner).await.map_err(unavailable)
    }

    async fn insert(
        &self,
        owner: &str,
        role: Role,
        content: &str,
    ) -> std::result::Result<StoredMessage, StoreError> {
        self.create_message(owner, role, content)
            .await
            .map_err(unavailable)
    }

    async fn clear(&self, _owner: &str) -> std::result::Result<u64, StoreError> {
        self.clear_messages().await.map_err(unavailable)
    }
}

#[async_trait]
impl Relay for ApiClient {
    async fn relay(&self, prompt: &str) -> std::result::Result<String, RelayError> {
        self.ask(prompt).await.map_err(|e| RelayError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    async fn logged_in(server: &MockServer) -> ApiClient {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/auth/login")
                    .json_body(json!({"email": "ada@example.com", "password": "pw"}));
                then.status(200).json_body(json!({
                    "accessToken": "tok",
                    "refreshToken": "ref",
                    "expiresIn": 900,
                    "tokenType": "Bearer",
                    "user": {"id": "u1", "email": "ada@example.com", "name": "Ada"}
                }));
            })
            .await;
        let (client, identity) = ApiClient::login(&server.base_url(), "ada@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(identity.display_name(), "Ada");
        client
    }

    #[tokio::test]
    async fn login_failure_carries_server_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/auth/login");
                then.status(401).json_body(json!({
                    "error": "unauthorized",
                    "message": "Invalid credentials"
                }));
            })
            .await;
        let err = ApiClient::login(&server.base_url(), "ada@example.com", "bad")
            .await
            .unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn list_sends_bearer_and_keeps_roles() {
        let server = MockServer::start_async().await;
        let client = logged_in(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/messages")
                    .header("authorization", "Bearer tok");
                then.status(200).json_body(json!({"messages": [
                    {"id": "0190a0a0-0000-7000-8000-000000000001", "role": "user",
                     "content": "2+2?", "createdAt": "2026-01-01T00:00:00Z"},
                    {"id": "0190a0a0-0000-7000-8000-000000000002", "role": "assistant",
                     "content": "4", "createdAt": "2026-01-01T00:00:01Z"}
                ]}));
            })
            .await;

        let rows = client.list("ada@example.com").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, Role::User);
        assert_eq!(rows[1].role, Role::Assistant);
        assert_eq!(rows[1].owner, "ada@example.com");
    }

    #[tokio::test]
    async fn relay_error_status_is_a_failure() {
        let server = MockServer::start_async().await;
        let client = logged_in(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/ai")
                    .json_body(json!({"message": "hello"}));
                then.status(500)
                    .json_body(json!({"reply": "Error talking to Gemini API"}));
            })
            .await;

        let err = client.relay("hello").await.unwrap_err();
        assert!(err.to_string().contains("Error talking to Gemini API"));
    }

    #[tokio::test]
    async fn relay_returns_reply() {
        let server = MockServer::start_async().await;
        let client = logged_in(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/ai");
                then.status(200).json_body(json!({"reply": "4"}));
            })
            .await;

        assert_eq!(client.relay("2+2?").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn clear_reports_deleted_count() {
        let server = MockServer::start_async().await;
        let client = logged_in(&server).await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/messages");
                then.status(200).json_body(json!({"deleted": 3}));
            })
            .await;

        assert_eq!(client.clear("ada@example.com").await.unwrap(), 3);
    }
}

//! Message API for the authenticated caller.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use gemchat_core::messages;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ClearMessagesResponse, CreateMessageRequest, MessageDto, MessageListResponse,
};

/// `GET /api/messages` — the caller's messages, oldest first.
pub async fn list_messages_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<MessageListResponse>> {
    let rows = messages::list_messages(&state.pool, &identity.email).await?;
    Ok(Json(MessageListResponse {
        messages: rows.into_iter().map(MessageDto::from).collect(),
    }))
}

/// `POST /api/messages` — store one message for the caller.
pub async fn create_message_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    Json(body): Json<CreateMessageRequest>,
) -> AppResult<(StatusCode, Json<MessageDto>)> {
    if body.content.is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }
    let row =
        messages::insert_message(&state.pool, &identity.email, body.role, &body.content).await?;
    Ok((StatusCode::CREATED, Json(MessageDto::from(row))))
}

/// `DELETE /api/messages` — remove every message of the caller.
pub async fn clear_messages_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<ClearMessagesResponse>> {
    let deleted = messages::clear_messages(&state.pool, &identity.email).await?;
    Ok(Json(ClearMessagesResponse { deleted }))
}

//! Chat relay — forwards one prompt to Gemini and returns the reply.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use gemchat_core::gemini::ERROR_REPLY;
use tracing::{debug, error};

use crate::AppState;
use crate::models::{RelayRequest, RelayResponse};

/// `POST /api/ai` — `{message}` in, `{reply}` out.
///
/// Every failure (unreadable body, transport error, upstream status, bad
/// upstream JSON) answers 500 with the same generic reply; the cause is only
/// logged.
pub async fn relay_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<RelayResponse>) {
    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Gemini API error: invalid request body");
            return failure();
        }
    };

    debug!(len = request.message.len(), "relaying prompt");
    match state.gemini.generate(&request.message).await {
        Ok(reply) => (StatusCode::OK, Json(RelayResponse { reply })),
        Err(e) => {
            error!(error = %e, "Gemini API error");
            failure()
        }
    }
}

fn failure() -> (StatusCode, Json<RelayResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(RelayResponse {
            reply: ERROR_REPLY.to_string(),
        }),
    )
}

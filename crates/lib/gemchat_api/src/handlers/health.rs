//! Liveness probe.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health` — always 200; reports whether the pool answers.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_connected = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: gemchat_core::version().to_string(),
        db_connected,
    })
}

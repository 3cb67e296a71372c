//! Authentication request handlers (JSON).

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AuthUser, LoginRequest, LogoutRequest, LogoutResponse, RefreshRequest, RegisterRequest,
    TokenResponse,
};
use crate::services::auth;

/// `POST /api/auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(
        &state.pool,
        &body.email,
        &body.password,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/auth/register` — create an account and sign it in.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::register(
        &state.pool,
        &body.email,
        &body.password,
        body.name.as_deref(),
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/auth/refresh` — exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh(
        &state.pool,
        &body.refresh_token,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/auth/logout` — revoke a refresh token.
pub async fn logout_handler(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequest>,
) -> AppResult<Json<LogoutResponse>> {
    let resp = auth::logout(&state.pool, body.refresh_token.as_deref()).await?;
    Ok(Json(resp))
}

/// `GET /api/auth/me`
pub async fn me_handler(
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> Json<AuthUser> {
    Json(AuthUser {
        id: identity.user_id,
        email: identity.email,
        name: identity.name,
    })
}

//! Authentication middleware — Bearer header or access cookie, verified as a JWT.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use gemchat_core::models::auth::Identity;

use crate::AppState;
use crate::error::AppError;
use crate::services::auth::verify_access_token;
use crate::services::cookies::ACCESS_COOKIE;

/// The caller, stored in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Pull the raw access token from `Authorization: Bearer` or the access cookie.
/// The header wins when both are present.
fn access_token(request: &Request) -> Result<String, AppError> {
    if let Some(header) = request.headers().get(AUTHORIZATION) {
        let header = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;
        return Ok(token.to_string());
    }

    CookieJar::from_headers(request.headers())
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))
}

/// Axum middleware: verifies the access token and injects
/// [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = access_token(&request)?;

    let claims = verify_access_token(&token, state.config.jwt_secret.as_bytes())
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser(Identity::from(claims)));

    Ok(next.run(request).await)
}

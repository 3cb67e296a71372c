//! Cookie session for the browser page.

use axum_extra::extract::CookieJar;
use gemchat_core::auth::jwt::ACCESS_TOKEN_EXPIRY_SECS;
use gemchat_core::models::auth::Identity;
use tracing::{debug, warn};

use super::auth::{self, verify_access_token};
use super::cookies::{
    ACCESS_COOKIE, REFRESH_COOKIE, access_cookie, clear_access_cookie, clear_refresh_cookie,
    refresh_cookie,
};
use crate::AppState;
use crate::error::AppError;
use crate::models::TokenResponse;

/// Put a fresh token pair into the jar.
pub fn with_tokens(jar: CookieJar, tokens: &TokenResponse, secure: bool) -> CookieJar {
    jar.add(access_cookie(
        &tokens.access_token,
        ACCESS_TOKEN_EXPIRY_SECS,
        secure,
    ))
    .add(refresh_cookie(&tokens.refresh_token, secure))
}

/// Expire both auth cookies.
pub fn without_tokens(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(clear_access_cookie(secure))
        .add(clear_refresh_cookie(secure))
}

/// Resolve the identity carried by the request cookies.
///
/// A valid access cookie is used as is. Otherwise a refresh cookie, if any,
/// is exchanged for a new pair and the returned jar carries the new cookies.
/// A rejected refresh token clears both cookies; other refresh failures leave
/// them in place. Without cookies nothing touches the database.
pub async fn resolve(state: &AppState, jar: CookieJar) -> (Option<Identity>, CookieJar) {
    let secret = state.config.jwt_secret.as_bytes();
    let secure = state.config.secure_cookies;

    if let Some(claims) = jar
        .get(ACCESS_COOKIE)
        .and_then(|c| verify_access_token(c.value(), secret))
    {
        return (Some(Identity::from(claims)), jar);
    }

    let Some(refresh_token) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()) else {
        return (None, jar);
    };

    match auth::refresh(&state.pool, &refresh_token, secret).await {
        Ok(tokens) => {
            debug!(email = %tokens.user.email, "session refreshed");
            let identity = Identity {
                user_id: tokens.user.id.clone(),
                email: tokens.user.email.clone(),
                name: tokens.user.name.clone(),
            };
            (Some(identity), with_tokens(jar, &tokens, secure))
        }
        Err(e @ AppError::Unauthorized(_)) => {
            debug!(error = %e, "session refresh rejected");
            (None, without_tokens(jar, secure))
        }
        // Anything else (e.g. the database is down) keeps the cookies for a later retry.
        Err(e) => {
            warn!(error = %e, "session refresh failed");
            (None, jar)
        }
    }
}

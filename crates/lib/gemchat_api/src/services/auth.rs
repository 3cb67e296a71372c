//! Authentication service — login/register/refresh flows over `gemchat_core::auth`.

use chrono::{Duration, Utc};
use gemchat_core::auth::{jwt, password, queries};
use gemchat_core::models::auth::{Identity, User};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{AuthUser, LogoutResponse, TokenResponse};

pub use gemchat_core::auth::jwt::{resolve_jwt_secret, verify_access_token};

/// Refresh token lifetime: 30 days.
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Trimmed, lowercased email; rejects values without an `@`.
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::Validation("Invalid email address".into())),
    }
}

/// SHA-256 hash a refresh token for storage.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Mint an access token plus a stored refresh token for `user`.
async fn issue_tokens(pool: &PgPool, user: User, jwt_secret: &[u8]) -> AppResult<TokenResponse> {
    let identity = Identity::from(user);
    let access_token = jwt::generate_access_token(&identity, jwt_secret)?;
    let refresh_token = jwt::random_token(64);

    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);
    queries::store_refresh_token(
        pool,
        &hash_refresh_token(&refresh_token),
        &identity.user_id,
        expires_at,
    )
    .await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        expires_in: jwt::ACCESS_TOKEN_EXPIRY_SECS,
        token_type: "Bearer".to_string(),
        user: AuthUser {
            id: identity.user_id,
            email: identity.email,
            name: identity.name,
        },
    })
}

/// Authenticate with email + password.
///
/// Unknown email and wrong password produce the same error.
pub async fn login(
    pool: &PgPool,
    email: &str,
    password: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let email = normalize_email(email)
        .map_err(|_| AppError::Unauthorized("Invalid credentials".into()))?;

    let Some((user, Some(hash))) = queries::find_user_by_email(pool, &email).await? else {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };
    if !password::verify_password(password, &hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    issue_tokens(pool, user, jwt_secret).await
}

/// Register a new account and sign it in.
pub async fn register(
    pool: &PgPool,
    email: &str,
    password: &str,
    name: Option<&str>,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let email = normalize_email(email)?;
    password::validate_password(password)?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    if queries::email_exists(pool, &email).await? {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let hash = password::hash_password(password)?;
    let id = queries::create_user(pool, &email, name, &hash).await?;
    info!(email = %email, "registered user");

    let user = User {
        id,
        email,
        name: name.map(str::to_string),
    };
    issue_tokens(pool, user, jwt_secret).await
}

/// Exchange a refresh token for a new pair. Refresh tokens are single-use.
pub async fn refresh(
    pool: &PgPool,
    refresh_token: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let token_hash = hash_refresh_token(refresh_token);

    let Some((token_id, user_id)) = queries::find_valid_refresh_token(pool, &token_hash).await?
    else {
        return Err(AppError::Unauthorized("Invalid refresh token".into()));
    };
    queries::revoke_refresh_token(pool, &token_id).await?;

    let user = queries::get_user_by_id(pool, &user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    issue_tokens(pool, user, jwt_secret).await
}

/// Revoke a refresh token, if one is given.
pub async fn logout(pool: &PgPool, refresh_token: Option<&str>) -> AppResult<LogoutResponse> {
    if let Some(token) = refresh_token {
        queries::revoke_refresh_token_by_hash(pool, &hash_refresh_token(token)).await?;
    }
    Ok(LogoutResponse { success: true })
}

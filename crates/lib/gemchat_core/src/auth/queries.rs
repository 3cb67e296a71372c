//! Account and refresh-token queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AuthError;
use crate::ids::new_id;
use crate::models::auth::User;

/// Fetch a user by email, returning the user and their password hash.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(User, Option<String>)>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, Option<String>, Option<String>)>(
        "SELECT id::text, email, name, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, email, name, hash)| (User { id, email, name }, hash)))
}

/// Create a new user, returning the user ID.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    password_hash: &str,
) -> Result<String, AuthError> {
    let user_id = sqlx::query_scalar::<_, String>(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING id::text",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(user_id)
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Fetch a user by ID.
pub async fn get_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT email, name FROM users WHERE id = $1::uuid",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(email, name)| User {
        id: user_id.to_string(),
        email,
        name,
    }))
}

/// Store a refresh token hash.
pub async fn store_refresh_token(
    pool: &PgPool,
    token_hash: &str,
    user_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at) \
         VALUES ($1, $2, $3::uuid, $4)",
    )
    .bind(new_id())
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Find a valid, non-revoked, non-expired refresh token. Returns (token_id, user_id).
pub async fn find_valid_refresh_token(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<(String, String)>, AuthError> {
    let row = sqlx::query_as::<_, (String, String)>(
        "SELECT id::text, user_id::text \
         FROM refresh_tokens \
         WHERE token_hash = $1 \
           AND revoked_at IS NULL \
           AND expires_at > now()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Revoke a refresh token by ID.
pub async fn revoke_refresh_token(pool: &PgPool, token_id: &str) -> Result<(), AuthError> {
    sqlx::query("UPDATE refresh_tokens SET revoked_at = now() WHERE id = $1::uuid")
        .bind(token_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revoke a refresh token by hash. Unknown hashes are ignored.
pub async fn revoke_refresh_token_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = now() \
         WHERE token_hash = $1 AND revoked_at IS NULL",
    )
    .bind(token_hash)
    .execute(pool)
    .await?;
    Ok(())
}

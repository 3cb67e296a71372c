//! Embedded schema migrations (`gemchat_core/migrations/`).

use sqlx::PgPool;

/// Apply every pending migration to the given pool.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

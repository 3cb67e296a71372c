//! Message persistence.
//!
//! Rows are partitioned by `owner` (the identity's email) and always read in
//! creation order. There is no update path: a turn inserts two rows and a
//! clear deletes every row of one owner.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::chat::{MessageStore, StoreError};
use crate::ids::new_id;
use crate::models::message::{Role, StoredMessage};

/// List an owner's messages, oldest first.
pub async fn list_messages(pool: &PgPool, owner: &str) -> Result<Vec<StoredMessage>, sqlx::Error> {
    sqlx::query_as::<_, StoredMessage>(
        r#"
        SELECT id, owner, role, content, created_at
        FROM messages
        WHERE owner = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await
}

/// Insert one message; the timestamp is assigned by the database.
pub async fn insert_message(
    pool: &PgPool,
    owner: &str,
    role: Role,
    content: &str,
) -> Result<StoredMessage, sqlx::Error> {
    sqlx::query_as::<_, StoredMessage>(
        r#"
        INSERT INTO messages (id, owner, role, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id, owner, role, content, created_at
        "#,
    )
    .bind(new_id())
    .bind(owner)
    .bind(role)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// Delete every message of an owner. Returns the number of rows removed.
pub async fn clear_messages(pool: &PgPool, owner: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM messages WHERE owner = $1")
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// [`MessageStore`] backed by the Postgres `messages` table.
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn list(&self, owner: &str) -> Result<Vec<StoredMessage>, StoreError> {
        Ok(list_messages(&self.pool, owner).await?)
    }

    async fn insert(
        &self,
        owner: &str,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        Ok(insert_message(&self.pool, owner, role, content).await?)
    }

    async fn clear(&self, owner: &str) -> Result<u64, StoreError> {
        Ok(clear_messages(&self.pool, owner).await?)
    }
}

//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use creator_core::entities::Message;
use creator_core::traits::{MessageQuery, MessageRepository, RepoResult};
use creator_core::value_objects::{MessageStatus, Snowflake};

use crate::mappers::MessageInsert;
use crate::models::MessageModel;

use super::error::{conversation_not_found, map_db_error, map_fk_violation};

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r#"
            SELECT id, conversation_id, sender_id, content, attachment, status,
                   created_at, updated_at, deleted_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn find_by_conversation(
        &self,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        let limit = query.limit.clamp(1, 100);

        let mut results = match (query.before, query.after) {
            (Some(before), None) => {
                // Page of older messages (scrolling up)
                sqlx::query_as::<_, MessageModel>(
                    r#"
                    SELECT id, conversation_id, sender_id, content, attachment, status,
                           created_at, updated_at, deleted_at
                    FROM messages
                    WHERE conversation_id = $1 AND id < $2 AND deleted_at IS NULL
                    ORDER BY id DESC
                    LIMIT $3
                    "#,
                )
                .bind(conversation_id.into_inner())
                .bind(before.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            (None, Some(after)) => {
                // Page of newer messages (scrolling down)
                sqlx::query_as::<_, MessageModel>(
                    r#"
                    SELECT id, conversation_id, sender_id, content, attachment, status,
                           created_at, updated_at, deleted_at
                    FROM messages
                    WHERE conversation_id = $1 AND id > $2 AND deleted_at IS NULL
                    ORDER BY id ASC
                    LIMIT $3
                    "#,
                )
                .bind(conversation_id.into_inner())
                .bind(after.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            _ => {
                // Latest page
                sqlx::query_as::<_, MessageModel>(
                    r#"
                    SELECT id, conversation_id, sender_id, content, attachment, status,
                           created_at, updated_at, deleted_at
                    FROM messages
                    WHERE conversation_id = $1 AND deleted_at IS NULL
                    ORDER BY id DESC
                    LIMIT $2
                    "#,
                )
                .bind(conversation_id.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        // Callers render oldest first regardless of the scan direction
        results.sort_by_key(|m| m.id);
        Ok(results.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn create(&self, message: &Message) -> RepoResult<()> {
        let insert = MessageInsert::new(message);
        sqlx::query(
            r#"
            INSERT INTO messages
                (id, conversation_id, sender_id, content, attachment, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            "#,
        )
        .bind(insert.id)
        .bind(insert.conversation_id)
        .bind(insert.sender_id)
        .bind(insert.content)
        .bind(insert.attachment)
        .bind(insert.status)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_fk_violation(e, || conversation_not_found(message.conversation_id)))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn advance_status(
        &self,
        id: Snowflake,
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Message>> {
        // Forward-only: the WHERE clause rejects equal or lower ranks
        let result = sqlx::query_as::<_, MessageModel>(
            r#"
            UPDATE messages
            SET status = $2, updated_at = $3
            WHERE id = $1
              AND deleted_at IS NULL
              AND message_status_rank(status) < message_status_rank($2)
            RETURNING id, conversation_id, sender_id, content, attachment, status,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(id.into_inner())
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET deleted_at = $2, updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

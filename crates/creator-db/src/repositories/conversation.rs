//! PostgreSQL implementation of ConversationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use creator_core::entities::{Conversation, ConversationSummary};
use creator_core::traits::{ConversationRepository, RepoResult};
use creator_core::value_objects::Snowflake;

use crate::models::{ConversationModel, ConversationSummaryModel};

use super::error::{conversation_not_found, map_db_error, map_fk_violation, user_not_found};

/// PostgreSQL implementation of ConversationRepository
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>> {
        let result = sqlx::query_as::<_, ConversationModel>(
            r#"
            SELECT c.id, c.name, c.is_group, c.created_at, c.updated_at,
                   ARRAY(
                       SELECT cp.user_id FROM conversation_participants cp
                       WHERE cp.conversation_id = c.id
                       ORDER BY cp.position
                   ) AS participant_ids
            FROM conversations c
            WHERE c.id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Conversation::from))
    }

    #[instrument(skip(self))]
    async fn find_direct(&self, a: Snowflake, b: Snowflake) -> RepoResult<Option<Conversation>> {
        let result = sqlx::query_as::<_, ConversationModel>(
            r#"
            SELECT c.id, c.name, c.is_group, c.created_at, c.updated_at,
                   ARRAY(
                       SELECT cp.user_id FROM conversation_participants cp
                       WHERE cp.conversation_id = c.id
                       ORDER BY cp.position
                   ) AS participant_ids
            FROM conversations c
            JOIN conversation_participants pa ON pa.conversation_id = c.id AND pa.user_id = $1
            JOIN conversation_participants pb ON pb.conversation_id = c.id AND pb.user_id = $2
            WHERE NOT c.is_group
            ORDER BY c.id
            LIMIT 1
            "#,
        )
        .bind(a.into_inner())
        .bind(b.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Conversation::from))
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn create(&self, conversation: &Conversation) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, name, is_group, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id.into_inner())
        .bind(conversation.name.as_deref())
        .bind(conversation.is_group)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        for (position, user_id) in conversation.participants.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (conversation_id, user_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(conversation.id.into_inner())
            .bind(user_id.into_inner())
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_fk_violation(e, || user_not_found(*user_id)))?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn touch(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET updated_at = GREATEST(updated_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(conversation_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_summaries(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationSummary>> {
        let rows = sqlx::query_as::<_, ConversationSummaryModel>(
            "SELECT * FROM list_user_conversations($1)",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(ConversationSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgConversationRepository>();
    }
}

//! PostgreSQL implementation of PinRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use creator_core::traits::{PinRepository, RepoResult};
use creator_core::value_objects::Snowflake;

use super::error::{conversation_not_found, map_db_error, map_fk_violation};

/// Per-user pin markers stored as rows of `conversation_pins`
#[derive(Clone)]
pub struct PgPinRepository {
    pool: PgPool,
}

impl PgPinRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PinRepository for PgPinRepository {
    #[instrument(skip(self))]
    async fn is_pinned(&self, user_id: Snowflake, conversation_id: Snowflake) -> RepoResult<bool> {
        let pinned: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM conversation_pins
                WHERE user_id = $1 AND conversation_id = $2
            )
            "#,
        )
        .bind(user_id.into_inner())
        .bind(conversation_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(pinned)
    }

    #[instrument(skip(self))]
    async fn set_pinned(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
        pinned: bool,
    ) -> RepoResult<()> {
        if pinned {
            sqlx::query(
                r#"
                INSERT INTO conversation_pins (user_id, conversation_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id.into_inner())
            .bind(conversation_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(|e| map_fk_violation(e, || conversation_not_found(conversation_id)))?;
        } else {
            sqlx::query(
                r#"
                DELETE FROM conversation_pins
                WHERE user_id = $1 AND conversation_id = $2
                "#,
            )
            .bind(user_id.into_inner())
            .bind(conversation_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        }

        Ok(())
    }
}

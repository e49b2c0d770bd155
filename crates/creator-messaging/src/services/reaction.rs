//! Reaction service
//!
//! Toggles emoji reactions on messages.

use chrono::Utc;
use creator_core::entities::Reaction;
use creator_core::events::ReactionChangedEvent;
use creator_core::{count_reactions, DomainEvent, ReactionCount, Snowflake, MAX_REACTIONS_PER_USER};
use creator_realtime::RealtimeChannel;
use tracing::{debug, info, instrument};

use super::context::ServiceContext;
use super::conversation::ConversationService;
use super::error::{ServiceError, ServiceResult};

/// Reaction service
pub struct ReactionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReactionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Add the reaction, or remove it when the user already reacted with it
    ///
    /// Returns `Some(true)` when added, `Some(false)` when removed, and
    /// `None` when the per-user cap made adding a no-op.
    #[instrument(skip(self))]
    pub async fn toggle_reaction(
        &self,
        user_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> ServiceResult<Option<bool>> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(ServiceError::validation("Emoji is required"));
        }

        let message = self
            .ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .filter(|m| !m.is_deleted())
            .ok_or_else(|| ServiceError::not_found("Message", message_id.to_string()))?;
        ConversationService::new(self.ctx)
            .require_participant(message.conversation_id, user_id)
            .await?;

        let added = if self
            .ctx
            .reaction_repo()
            .find(message_id, user_id, emoji)
            .await?
            .is_some()
        {
            self.ctx.reaction_repo().delete(message_id, user_id, emoji).await?;
            false
        } else {
            let held = self.ctx.reaction_repo().count_by_user(message_id, user_id).await?;
            if held >= MAX_REACTIONS_PER_USER as i64 {
                debug!(held, "Reaction cap reached, ignoring");
                return Ok(None);
            }
            self.ctx
                .reaction_repo()
                .create(&Reaction::new(message_id, user_id, emoji))
                .await?;
            true
        };

        info!(added, "Reaction toggled");

        let event = DomainEvent::ReactionChanged(ReactionChangedEvent {
            message_id,
            conversation_id: message.conversation_id,
            user_id,
            emoji: emoji.to_string(),
            added,
            timestamp: Utc::now(),
        });
        self.ctx
            .publish(&RealtimeChannel::messages(message.conversation_id), &event)
            .await;
        Ok(Some(added))
    }

    /// Per-emoji counts for a message, relative to `viewer`
    pub async fn get_reactions(
        &self,
        viewer: Snowflake,
        message_id: Snowflake,
    ) -> ServiceResult<Vec<ReactionCount>> {
        let reactions = self.ctx.reaction_repo().find_by_message(message_id).await?;
        Ok(count_reactions(&reactions, viewer))
    }
}

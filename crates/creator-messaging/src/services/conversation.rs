//! Conversation aggregator
//!
//! Lists a user's conversations with counterpart, last message, and pin
//! state in one repository round trip, and manages per-user pins.

use chrono::Utc;
use creator_core::events::ConversationUpdatedEvent;
use creator_core::{
    sort_by_recent_activity, Conversation, ConversationSummary, DomainError, DomainEvent, Snowflake,
};
use creator_realtime::RealtimeChannel;
use tracing::{info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Conversation service
pub struct ConversationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ConversationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Conversations of `user_id`, most recently active first
    ///
    /// Never fails: on error a notice is raised and the list is empty.
    #[instrument(skip(self))]
    pub async fn list_conversations(&self, user_id: Snowflake) -> Vec<ConversationSummary> {
        match self.ctx.conversation_repo().list_summaries(user_id).await {
            Ok(mut summaries) => {
                sort_by_recent_activity(&mut summaries);
                summaries
            }
            Err(e) => {
                warn!(error = %e, "Failed to load conversations");
                self.ctx.notices().from_error(&e.into());
                Vec::new()
            }
        }
    }

    /// Flip the user's pin on a conversation and return the resulting state
    ///
    /// On a failed write the unchanged state is returned with a notice.
    /// When the current state cannot be read, or the user is not a
    /// participant, `false` is reported.
    #[instrument(skip(self))]
    pub async fn toggle_pin(&self, user_id: Snowflake, conversation_id: Snowflake) -> bool {
        if let Err(e) = self.require_participant(conversation_id, user_id).await {
            warn!(error = %e, "Pin rejected");
            self.ctx.notices().from_error(&e);
            return false;
        }

        let pinned = match self.ctx.pin_repo().is_pinned(user_id, conversation_id).await {
            Ok(pinned) => pinned,
            Err(e) => {
                warn!(error = %e, "Failed to read pin state");
                self.ctx.notices().from_error(&e.into());
                return false;
            }
        };

        match self
            .ctx
            .pin_repo()
            .set_pinned(user_id, conversation_id, !pinned)
            .await
        {
            Ok(()) => {
                info!(pinned = !pinned, "Conversation pin toggled");
                !pinned
            }
            Err(e) => {
                warn!(error = %e, "Failed to store pin state");
                self.ctx.notices().from_error(&e.into());
                pinned
            }
        }
    }

    /// The two-party conversation between two users, created on first contact
    #[instrument(skip(self))]
    pub async fn find_or_create_direct(
        &self,
        user_id: Snowflake,
        other_id: Snowflake,
    ) -> ServiceResult<Conversation> {
        if user_id == other_id {
            return Err(ServiceError::validation("Cannot start a conversation with yourself"));
        }
        if let Some(existing) = self.ctx.conversation_repo().find_direct(user_id, other_id).await? {
            return Ok(existing);
        }

        self.ctx
            .user_repo()
            .find_by_id(other_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", other_id.to_string()))?;

        let conversation = Conversation::direct(self.ctx.generate_id(), user_id, other_id);
        self.ctx.conversation_repo().create(&conversation).await?;
        info!(conversation_id = %conversation.id, "Direct conversation created");

        self.announce(&conversation, None).await;
        Ok(conversation)
    }

    /// Form a named group; the creator is always a participant
    #[instrument(skip(self, members))]
    pub async fn create_group(
        &self,
        creator_id: Snowflake,
        name: &str,
        members: &[Snowflake],
    ) -> ServiceResult<Conversation> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Group name is required"));
        }

        let mut participants = vec![creator_id];
        participants.extend_from_slice(members);
        let conversation = Conversation::group(self.ctx.generate_id(), name, participants);
        if conversation.participants.len() < 2 {
            return Err(ServiceError::validation("A group needs at least one other member"));
        }

        self.ctx.conversation_repo().create(&conversation).await?;
        info!(conversation_id = %conversation.id, members = conversation.participants.len(), "Group created");

        self.announce(&conversation, None).await;
        Ok(conversation)
    }

    /// The conversation, provided `user_id` takes part in it
    pub async fn require_participant(
        &self,
        conversation_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Conversation> {
        let conversation = self
            .ctx
            .conversation_repo()
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Conversation", conversation_id.to_string()))?;

        if !conversation.has_participant(user_id) {
            return Err(DomainError::NotParticipant(conversation_id).into());
        }
        Ok(conversation)
    }

    /// Tell every participant their conversation list changed
    pub(crate) async fn announce(&self, conversation: &Conversation, last_message_id: Option<Snowflake>) {
        let event = DomainEvent::ConversationUpdated(ConversationUpdatedEvent {
            conversation_id: conversation.id,
            last_message_id,
            timestamp: Utc::now(),
        });
        for participant in &conversation.participants {
            self.ctx.publish(&RealtimeChannel::user(*participant), &event).await;
        }
    }
}

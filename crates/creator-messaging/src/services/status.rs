//! Message status tracker
//!
//! Moves messages forward through `sent -> delivered -> read` on behalf of
//! a recipient and announces every move on the conversation's message
//! channel.

use chrono::Utc;
use creator_core::{DomainEvent, Message, MessageStatus, Snowflake};
use creator_realtime::RealtimeChannel;
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::session::Visibility;

/// Message status service
pub struct StatusService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatusService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Advance one message on behalf of `viewer`
    ///
    /// Returns the new status, or `None` when nothing changed: the viewer
    /// sent the message, the message is unknown or deleted, or the move is
    /// not forward.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        viewer: Snowflake,
        message_id: Snowflake,
        status: MessageStatus,
    ) -> ServiceResult<Option<MessageStatus>> {
        let Some(message) = self.ctx.message_repo().find_by_id(message_id).await? else {
            debug!("Unknown message, status unchanged");
            return Ok(None);
        };
        let advanced = self.advance(viewer, &message, status).await?;
        Ok(advanced.map(|m| m.status))
    }

    /// Mark every `sent` message from someone else as delivered
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub async fn mark_delivered(
        &self,
        viewer: Snowflake,
        messages: &[Message],
    ) -> ServiceResult<Vec<Message>> {
        let mut updated = Vec::new();
        for message in messages
            .iter()
            .filter(|m| m.status == MessageStatus::Sent)
        {
            if let Some(m) = self.advance(viewer, message, MessageStatus::Delivered).await? {
                updated.push(m);
            }
        }
        Ok(updated)
    }

    /// Mark every unread message from someone else as read
    ///
    /// Writes nothing unless the app is in the foreground.
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub async fn mark_read(
        &self,
        viewer: Snowflake,
        messages: &[Message],
        visibility: Visibility,
    ) -> ServiceResult<Vec<Message>> {
        if !visibility.is_foreground() {
            debug!("Backgrounded, read receipts deferred");
            return Ok(Vec::new());
        }

        let mut updated = Vec::new();
        for message in messages.iter().filter(|m| m.status != MessageStatus::Read) {
            if let Some(m) = self.advance(viewer, message, MessageStatus::Read).await? {
                updated.push(m);
            }
        }
        Ok(updated)
    }

    async fn advance(
        &self,
        viewer: Snowflake,
        message: &Message,
        status: MessageStatus,
    ) -> ServiceResult<Option<Message>> {
        if message.is_deleted() || !message.can_advance(viewer, status) {
            return Ok(None);
        }

        // Conditional write: a concurrent reader may already be further along
        let Some(updated) = self
            .ctx
            .message_repo()
            .advance_status(message.id, status, Utc::now())
            .await?
        else {
            return Ok(None);
        };

        debug!(message_id = %updated.id, status = %updated.status, "Message status advanced");
        self.ctx
            .publish(
                &RealtimeChannel::messages(updated.conversation_id),
                &DomainEvent::status_changed(&updated),
            )
            .await;
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::TestEnv;
    use creator_core::traits::MessageRepository;
    use creator_db::StoreOp;

    #[tokio::test]
    async fn test_status_never_regresses() {
        let env = TestEnv::new().await;
        let message = env.seed_message(env.ana.id, "hello").await;
        let service = StatusService::new(&env.ctx);

        let delivered = service
            .advance_status(env.bo.id, message.id, MessageStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered, Some(MessageStatus::Delivered));

        let back = service
            .advance_status(env.bo.id, message.id, MessageStatus::Sent)
            .await
            .unwrap();
        assert_eq!(back, None);

        let stored = env.store.find_by_id(message.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Delivered);
    }

    #[tokio::test]
    async fn test_sender_cannot_advance_own_message() {
        let env = TestEnv::new().await;
        let message = env.seed_message(env.ana.id, "hello").await;
        let service = StatusService::new(&env.ctx);

        let result = service
            .advance_status(env.ana.id, message.id, MessageStatus::Read)
            .await
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(env.store.calls(StoreOp::StatusWrite), 0);
    }

    #[tokio::test]
    async fn test_unknown_message_is_noop() {
        let env = TestEnv::new().await;
        let service = StatusService::new(&env.ctx);
        let result = service
            .advance_status(env.bo.id, Snowflake::new(999), MessageStatus::Read)
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_no_read_writes_while_backgrounded() {
        let env = TestEnv::new().await;
        let incoming = vec![
            env.seed_message(env.ana.id, "one").await,
            env.seed_message(env.ana.id, "two").await,
        ];
        let service = StatusService::new(&env.ctx);

        let updated = service
            .mark_read(env.bo.id, &incoming, Visibility::Background)
            .await
            .unwrap();
        assert!(updated.is_empty());
        assert_eq!(env.store.calls(StoreOp::StatusWrite), 0);

        let updated = service
            .mark_read(env.bo.id, &incoming, Visibility::Foreground)
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|m| m.status == MessageStatus::Read));
    }

    #[tokio::test]
    async fn test_mark_delivered_skips_own_and_advanced() {
        let env = TestEnv::new().await;
        let mine = env.seed_message(env.bo.id, "mine").await;
        let theirs = env.seed_message(env.ana.id, "theirs").await;
        let service = StatusService::new(&env.ctx);

        let updated = service
            .mark_delivered(env.bo.id, &[mine.clone(), theirs.clone()])
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, theirs.id);

        // Second pass has nothing left in `sent`
        let again = service
            .mark_delivered(env.bo.id, &updated)
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_status_change_is_published() {
        let env = TestEnv::new().await;
        let message = env.seed_message(env.ana.id, "hello").await;
        let mut sub = env.subscribe(&RealtimeChannel::messages(env.conversation.id)).await;

        StatusService::new(&env.ctx)
            .advance_status(env.bo.id, message.id, MessageStatus::Read)
            .await
            .unwrap();

        match sub.recv().await {
            Some(DomainEvent::MessageStatusChanged(e)) => {
                assert_eq!(e.message_id, message.id);
                assert_eq!(e.status, MessageStatus::Read);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

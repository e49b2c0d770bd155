//! Message service
//!
//! Composes, persists, loads, and deletes messages, and stores
//! attachments.

use chrono::Utc;
use creator_core::traits::MessageQuery;
use creator_core::{DomainError, DomainEvent, Message, Snowflake};
use creator_realtime::RealtimeChannel;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{AttachmentResponse, SendMessageRequest, UploadAttachmentRequest};

use super::context::ServiceContext;
use super::conversation::ConversationService;
use super::error::{ServiceError, ServiceResult};

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Validate a request and build the `sent` message without storing it
    pub fn compose(
        &self,
        sender_id: Snowflake,
        conversation_id: Snowflake,
        request: SendMessageRequest,
    ) -> ServiceResult<Message> {
        request.validate()?;
        Ok(Message::new(
            self.ctx.generate_id(),
            conversation_id,
            sender_id,
            request.content.trim().to_string(),
            request.attachment,
        ))
    }

    /// Store a composed message, bump its conversation, and announce it
    #[instrument(skip(self, message), fields(message_id = %message.id, conversation_id = %message.conversation_id))]
    pub async fn persist(&self, message: &Message) -> ServiceResult<()> {
        let conversation = ConversationService::new(self.ctx)
            .require_participant(message.conversation_id, message.sender_id)
            .await?;

        self.ctx.message_repo().create(message).await?;

        // The message is stored from here on; the bump is best-effort and
        // list ordering still sees the last message's own timestamp
        if let Err(e) = self
            .ctx
            .conversation_repo()
            .touch(message.conversation_id, message.created_at)
            .await
        {
            warn!(error = %e, "Failed to bump conversation");
        }

        info!("Message sent");

        self.ctx
            .publish(
                &RealtimeChannel::messages(message.conversation_id),
                &DomainEvent::message_created(message.clone()),
            )
            .await;
        ConversationService::new(self.ctx)
            .announce(&conversation, Some(message.id))
            .await;
        Ok(())
    }

    /// Compose and persist in one step
    pub async fn send_message(
        &self,
        sender_id: Snowflake,
        conversation_id: Snowflake,
        request: SendMessageRequest,
    ) -> ServiceResult<Message> {
        let message = self.compose(sender_id, conversation_id, request)?;
        self.persist(&message).await?;
        Ok(message)
    }

    /// A page of live messages, oldest first
    #[instrument(skip(self))]
    pub async fn get_messages(
        &self,
        viewer: Snowflake,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> ServiceResult<Vec<Message>> {
        ConversationService::new(self.ctx)
            .require_participant(conversation_id, viewer)
            .await?;
        Ok(self
            .ctx
            .message_repo()
            .find_by_conversation(conversation_id, query)
            .await?)
    }

    /// Soft-delete a message; only its sender may
    #[instrument(skip(self))]
    pub async fn delete_message(&self, viewer: Snowflake, message_id: Snowflake) -> ServiceResult<()> {
        let mut message = self
            .ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .filter(|m| !m.is_deleted())
            .ok_or_else(|| ServiceError::not_found("Message", message_id.to_string()))?;

        if !message.is_from(viewer) {
            return Err(DomainError::NotMessageSender.into());
        }

        let now = Utc::now();
        if !self.ctx.message_repo().soft_delete(message_id, now).await? {
            // Deleted concurrently; nothing left to announce
            return Ok(());
        }
        message.deleted_at = Some(now);
        message.updated_at = now;

        info!("Message deleted");

        self.ctx
            .publish(
                &RealtimeChannel::messages(message.conversation_id),
                &DomainEvent::message_deleted(&message),
            )
            .await;
        Ok(())
    }

    /// Store an attachment and return its public URL
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn upload_attachment(
        &self,
        uploader: Snowflake,
        request: UploadAttachmentRequest,
        bytes: &[u8],
    ) -> ServiceResult<AttachmentResponse> {
        request.validate()?;
        if bytes.is_empty() {
            return Err(ServiceError::validation("Attachment is empty"));
        }

        let path = format!(
            "attachments/{uploader}/{}-{}",
            self.ctx.generate_id(),
            sanitize_file_name(&request.file_name)
        );
        let stored = self.ctx.blob_storage().upload(&path, bytes, false).await?;
        let url = self.ctx.blob_storage().public_url(&stored);

        info!(path = %stored, "Attachment uploaded");
        Ok(AttachmentResponse { path: stored, url })
    }
}

/// Keep a file name safe to use as one path segment
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

//! Message entity <-> model mapper

use creator_core::entities::Message;
use creator_core::value_objects::{MessageStatus, Snowflake};

use crate::models::MessageModel;

/// Parse a stored status; the column CHECK keeps unknown values out
pub(crate) fn parse_status(raw: &str) -> MessageStatus {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(status = raw, "Unknown message status in database");
        MessageStatus::Sent
    })
}

/// Convert MessageModel to Message entity
impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            conversation_id: Snowflake::new(model.conversation_id),
            sender_id: Snowflake::new(model.sender_id),
            content: model.content,
            attachment: model.attachment,
            status: parse_status(&model.status),
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        }
    }
}

/// Convert Message entity reference to values for database insertion
pub struct MessageInsert<'a> {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: &'a str,
    pub attachment: Option<&'a str>,
    pub status: &'static str,
}

impl<'a> MessageInsert<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            id: message.id.into_inner(),
            conversation_id: message.conversation_id.into_inner(),
            sender_id: message.sender_id.into_inner(),
            content: &message.content,
            attachment: message.attachment.as_deref(),
            status: message.status.as_str(),
        }
    }
}

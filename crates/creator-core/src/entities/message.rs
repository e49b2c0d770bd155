//! Message entity - a direct or group chat message with delivery status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageStatus, Snowflake};

/// Maximum message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender_id: Snowflake,
    pub content: String,
    /// Blob storage path or public URL of an attached file
    pub attachment: Option<String>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a new message in `sent` state
    pub fn new(
        id: Snowflake,
        conversation_id: Snowflake,
        sender_id: Snowflake,
        content: String,
        attachment: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation_id,
            sender_id,
            content,
            attachment,
            status: MessageStatus::Sent,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[inline]
    pub fn is_from(&self, user_id: Snowflake) -> bool {
        self.sender_id == user_id
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `viewer` may move this message to `next`
    pub fn can_advance(&self, viewer: Snowflake, next: MessageStatus) -> bool {
        !self.is_from(viewer) && self.status.is_forward(next)
    }

    /// Apply an observed status; returns true when the status moved forward
    pub fn apply_status(&mut self, next: MessageStatus, at: DateTime<Utc>) -> bool {
        if !self.status.is_forward(next) {
            return false;
        }
        self.status = next;
        self.updated_at = at;
        true
    }

    /// Truncated content for conversation list previews
    pub fn preview(&self, max_chars: usize) -> String {
        if self.content.trim().is_empty() && self.attachment.is_some() {
            return "[attachment]".to_string();
        }
        match self.content.char_indices().nth(max_chars) {
            Some((end, _)) => format!("{}…", &self.content[..end]),
            None => self.content.clone(),
        }
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message::new(
            Snowflake::new(1),
            Snowflake::new(10),
            Snowflake::new(100),
            "hello there".to_string(),
            None,
        )
    }

    #[test]
    fn test_new_message_is_sent() {
        let msg = message();
        assert_eq!(msg.status, MessageStatus::Sent);
        assert!(msg.is_from(Snowflake::new(100)));
        assert!(!msg.is_deleted());
    }

    #[test]
    fn test_sender_cannot_advance() {
        let msg = message();
        assert!(!msg.can_advance(Snowflake::new(100), MessageStatus::Read));
        assert!(msg.can_advance(Snowflake::new(200), MessageStatus::Read));
    }

    #[test]
    fn test_apply_status_is_forward_only() {
        let mut msg = message();
        assert!(msg.apply_status(MessageStatus::Delivered, Utc::now()));
        assert!(!msg.apply_status(MessageStatus::Sent, Utc::now()));
        assert_eq!(msg.status, MessageStatus::Delivered);
        assert!(msg.apply_status(MessageStatus::Read, Utc::now()));
        assert!(!msg.apply_status(MessageStatus::Read, Utc::now()));
    }

    #[test]
    fn test_preview() {
        let msg = message();
        assert_eq!(msg.preview(5), "hello…");
        assert_eq!(msg.preview(100), "hello there");

        let mut attachment_only = message();
        attachment_only.content = String::new();
        attachment_only.attachment = Some("uploads/a.png".to_string());
        assert_eq!(attachment_only.preview(10), "[attachment]");
    }
}

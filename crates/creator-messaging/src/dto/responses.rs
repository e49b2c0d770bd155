//! Response DTOs
//!
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use creator_core::{MessageStatus, ReactionCount};
use serde::Serialize;

/// One row of the conversation list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationListItem {
    pub id: String,
    pub title: String,
    pub avatar: Option<String>,
    pub is_group: bool,
    /// Counterpart's online flag; always false for groups
    pub is_online: bool,
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessageResponse>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastMessageResponse {
    pub id: String,
    pub sender_id: String,
    pub preview: String,
    pub status: MessageStatus,
    /// Whether the viewing user sent it
    pub mine: bool,
    pub created_at: DateTime<Utc>,
}

/// Message as rendered in an open conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    pub status: MessageStatus,
    pub mine: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<ReactionCount>,
    pub created_at: DateTime<Utc>,
}

/// Uploaded attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentResponse {
    pub path: String,
    pub url: String,
}

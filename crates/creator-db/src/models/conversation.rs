//! Conversation database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Conversation row with its participants aggregated in join order
#[derive(Debug, Clone, FromRow)]
pub struct ConversationModel {
    pub id: i64,
    pub name: Option<String>,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub participant_ids: Vec<i64>,
}

/// One row of `list_user_conversations`
///
/// Counterpart columns are NULL for group conversations, last-message
/// columns are NULL while a conversation has no live message.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationSummaryModel {
    pub id: i64,
    pub name: Option<String>,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub participant_ids: Vec<i64>,

    pub counterpart_id: Option<i64>,
    pub counterpart_username: Option<String>,
    pub counterpart_display_name: Option<String>,
    pub counterpart_avatar: Option<String>,
    pub counterpart_is_online: Option<bool>,
    pub counterpart_last_seen: Option<DateTime<Utc>>,
    pub counterpart_created_at: Option<DateTime<Utc>>,

    pub last_message_id: Option<i64>,
    pub last_message_sender_id: Option<i64>,
    pub last_message_content: Option<String>,
    pub last_message_attachment: Option<String>,
    pub last_message_status: Option<String>,
    pub last_message_created_at: Option<DateTime<Utc>>,
    pub last_message_updated_at: Option<DateTime<Utc>>,

    pub pinned: bool,
}

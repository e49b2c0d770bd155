//! Entity to DTO mappers
//!
//! Conversions take the viewing user, since "mine" and the conversation
//! title depend on who is looking.

use creator_core::{count_reactions, ConversationSummary, Message, Reaction, Snowflake};

use super::responses::{ConversationListItem, LastMessageResponse, MessageResponse};

impl ConversationListItem {
    pub fn from_summary(summary: &ConversationSummary, viewer: Snowflake) -> Self {
        let counterpart = summary.counterpart.as_ref();
        Self {
            id: summary.conversation.id.to_string(),
            title: summary.title(),
            avatar: counterpart.and_then(|u| u.avatar.clone()),
            is_group: summary.conversation.is_group,
            is_online: counterpart.is_some_and(|u| u.is_online),
            pinned: summary.pinned,
            last_message: summary.last_message.as_ref().map(|m| LastMessageResponse {
                id: m.id.to_string(),
                sender_id: m.sender_id.to_string(),
                preview: m.preview.clone(),
                status: m.status,
                mine: m.sender_id == viewer,
                created_at: m.created_at,
            }),
            last_activity: summary.last_activity(),
        }
    }
}

impl MessageResponse {
    pub fn from_message(message: &Message, reactions: &[Reaction], viewer: Snowflake) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message.conversation_id.to_string(),
            sender_id: message.sender_id.to_string(),
            content: message.content.clone(),
            attachment: message.attachment.clone(),
            status: message.status,
            mine: message.is_from(viewer),
            reactions: count_reactions(reactions, viewer),
            created_at: message.created_at,
        }
    }
}

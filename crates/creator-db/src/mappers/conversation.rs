//! Conversation entity <-> model mapper

use creator_core::entities::{Conversation, ConversationSummary, LastMessage, Message, User};
use creator_core::value_objects::Snowflake;

use super::message::parse_status;
use crate::models::{ConversationModel, ConversationSummaryModel};

/// Convert ConversationModel to Conversation entity
impl From<ConversationModel> for Conversation {
    fn from(model: ConversationModel) -> Self {
        Conversation {
            id: Snowflake::new(model.id),
            name: model.name,
            is_group: model.is_group,
            participants: model.participant_ids.into_iter().map(Snowflake::new).collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Convert one aggregation row to the read model
impl From<ConversationSummaryModel> for ConversationSummary {
    fn from(model: ConversationSummaryModel) -> Self {
        let counterpart = match (model.counterpart_id, model.counterpart_username) {
            (Some(id), Some(username)) => Some(User {
                id: Snowflake::new(id),
                username,
                display_name: model.counterpart_display_name,
                avatar: model.counterpart_avatar,
                is_online: model.counterpart_is_online.unwrap_or(false),
                last_seen: model.counterpart_last_seen,
                created_at: model.counterpart_created_at.unwrap_or(model.created_at),
            }),
            _ => None,
        };

        let last_message = match (
            model.last_message_id,
            model.last_message_sender_id,
            model.last_message_created_at,
        ) {
            (Some(id), Some(sender_id), Some(created_at)) => {
                let message = Message {
                    id: Snowflake::new(id),
                    conversation_id: Snowflake::new(model.id),
                    sender_id: Snowflake::new(sender_id),
                    content: model.last_message_content.unwrap_or_default(),
                    attachment: model.last_message_attachment,
                    status: model
                        .last_message_status
                        .as_deref()
                        .map(parse_status)
                        .unwrap_or_default(),
                    created_at,
                    updated_at: model.last_message_updated_at.unwrap_or(created_at),
                    deleted_at: None,
                };
                Some(LastMessage::from(&message))
            }
            _ => None,
        };

        ConversationSummary {
            conversation: Conversation {
                id: Snowflake::new(model.id),
                name: model.name,
                is_group: model.is_group,
                participants: model.participant_ids.into_iter().map(Snowflake::new).collect(),
                created_at: model.created_at,
                updated_at: model.updated_at,
            },
            counterpart,
            last_message,
            pinned: model.pinned,
        }
    }
}

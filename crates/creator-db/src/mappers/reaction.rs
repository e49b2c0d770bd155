//! Reaction entity <-> model mapper

use chrono::{DateTime, Utc};
use creator_core::entities::Reaction;
use creator_core::value_objects::Snowflake;

use crate::models::ReactionModel;

impl From<ReactionModel> for Reaction {
    fn from(model: ReactionModel) -> Self {
        Reaction {
            message_id: Snowflake::new(model.message_id),
            user_id: Snowflake::new(model.user_id),
            emoji: model.emoji,
            created_at: model.created_at,
        }
    }
}

/// Bind values for a reaction insert
pub struct ReactionInsert<'a> {
    pub message_id: i64,
    pub user_id: i64,
    pub emoji: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> ReactionInsert<'a> {
    pub fn new(reaction: &'a Reaction) -> Self {
        Self {
            message_id: reaction.message_id.into_inner(),
            user_id: reaction.user_id.into_inner(),
            emoji: &reaction.emoji,
            created_at: reaction.created_at,
        }
    }
}

//! Reaction entity - an emoji reaction on a message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Maximum distinct emoji one user may hold on a single message
pub const MAX_REACTIONS_PER_USER: usize = 20;

/// Reaction entity
///
/// At most one reaction per (message, user, emoji).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: Snowflake,
    pub user_id: Snowflake,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn new(message_id: Snowflake, user_id: Snowflake, emoji: impl Into<String>) -> Self {
        Self {
            message_id,
            user_id,
            emoji: emoji.into(),
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_emoji(&self, emoji: &str) -> bool {
        self.emoji == emoji
    }
}

/// Aggregated reaction count for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: i64,
    /// Whether the viewing user is among the reactors
    pub me: bool,
}

/// Fold individual reactions into per-emoji counts, in first-reacted order
pub fn count_reactions(reactions: &[Reaction], viewer: Snowflake) -> Vec<ReactionCount> {
    let mut counts: Vec<ReactionCount> = Vec::new();
    for reaction in reactions {
        match counts.iter_mut().find(|c| c.emoji == reaction.emoji) {
            Some(c) => {
                c.count += 1;
                c.me |= reaction.user_id == viewer;
            }
            None => counts.push(ReactionCount {
                emoji: reaction.emoji.clone(),
                count: 1,
                me: reaction.user_id == viewer,
            }),
        }
    }
    counts
}

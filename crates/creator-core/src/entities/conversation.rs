//! Conversation entity and the per-viewer summary read model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Message, User};
use crate::value_objects::{MessageStatus, Snowflake};

/// Conversation entity
///
/// Conversations are never hard-deleted. Pin state is not stored here: it is
/// a per-user marker kept by the pin repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Snowflake,
    pub name: Option<String>,
    pub is_group: bool,
    /// Participant ids in join order
    pub participants: Vec<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a two-party conversation
    pub fn direct(id: Snowflake, a: Snowflake, b: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: None,
            is_group: false,
            participants: vec![a, b],
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a named group conversation
    pub fn group(id: Snowflake, name: impl Into<String>, participants: Vec<Snowflake>) -> Self {
        let now = Utc::now();
        let mut unique = Vec::with_capacity(participants.len());
        for p in participants {
            if !unique.contains(&p) {
                unique.push(p);
            }
        }
        Self {
            id,
            name: Some(name.into()),
            is_group: true,
            participants: unique,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn has_participant(&self, user_id: Snowflake) -> bool {
        self.participants.contains(&user_id)
    }

    /// The other participant of a two-party conversation
    pub fn counterpart_of(&self, user_id: Snowflake) -> Option<Snowflake> {
        if self.is_group {
            return None;
        }
        self.participants.iter().copied().find(|&p| p != user_id)
    }

    /// Mark activity (a new message arrived)
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}

/// Compact view of the latest message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub id: Snowflake,
    pub sender_id: Snowflake,
    pub preview: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl LastMessage {
    pub const PREVIEW_CHARS: usize = 80;
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            preview: message.preview(Self::PREVIEW_CHARS),
            status: message.status,
            created_at: message.created_at,
        }
    }
}

/// A conversation as listed for one viewing user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    /// The other participant, for two-party conversations
    pub counterpart: Option<User>,
    pub last_message: Option<LastMessage>,
    pub pinned: bool,
}

impl ConversationSummary {
    /// Time used for list ordering: the last message, else the conversation itself
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map_or(self.conversation.updated_at, |m| {
                m.created_at.max(self.conversation.updated_at)
            })
    }

    /// Title to render: group name, else the counterpart's name
    pub fn title(&self) -> String {
        if let Some(name) = &self.conversation.name {
            return name.clone();
        }
        self.counterpart
            .as_ref()
            .map_or_else(|| "Conversation".to_string(), |u| u.name().to_string())
    }
}

/// Order summaries by most recent activity first (ties: newest id first)
pub fn sort_by_recent_activity(summaries: &mut [ConversationSummary]) {
    summaries.sort_by(|a, b| {
        b.last_activity()
            .cmp(&a.last_activity())
            .then_with(|| b.conversation.id.cmp(&a.conversation.id))
    });
}

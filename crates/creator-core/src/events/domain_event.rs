//! Domain events - state changes fanned out to realtime subscribers
//!
//! Every successful write in the messaging layer publishes one of these on
//! the matching realtime channel; subscribers reconcile their local state
//! from them instead of polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Message, TypingSignal};
use crate::value_objects::{MessageStatus, Snowflake};

/// All possible domain events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    // =========================================================================
    // Message Events
    // =========================================================================
    MessageCreated(MessageCreatedEvent),
    MessageStatusChanged(MessageStatusChangedEvent),
    MessageDeleted(MessageDeletedEvent),

    // =========================================================================
    // Reaction Events
    // =========================================================================
    ReactionChanged(ReactionChangedEvent),

    // =========================================================================
    // Conversation Events
    // =========================================================================
    ConversationUpdated(ConversationUpdatedEvent),

    // =========================================================================
    // Presence Events
    // =========================================================================
    PresenceChanged(PresenceChangedEvent),
    TypingChanged(TypingChangedEvent),
}

impl DomainEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageCreated(_) => "MESSAGE_CREATED",
            Self::MessageStatusChanged(_) => "MESSAGE_STATUS_CHANGED",
            Self::MessageDeleted(_) => "MESSAGE_DELETED",
            Self::ReactionChanged(_) => "REACTION_CHANGED",
            Self::ConversationUpdated(_) => "CONVERSATION_UPDATED",
            Self::PresenceChanged(_) => "PRESENCE_CHANGED",
            Self::TypingChanged(_) => "TYPING_CHANGED",
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MessageCreated(e) => e.timestamp,
            Self::MessageStatusChanged(e) => e.timestamp,
            Self::MessageDeleted(e) => e.timestamp,
            Self::ReactionChanged(e) => e.timestamp,
            Self::ConversationUpdated(e) => e.timestamp,
            Self::PresenceChanged(e) => e.timestamp,
            Self::TypingChanged(e) => e.timestamp,
        }
    }

    /// Conversation the event belongs to, if any
    pub fn conversation_id(&self) -> Option<Snowflake> {
        match self {
            Self::MessageCreated(e) => Some(e.message.conversation_id),
            Self::MessageStatusChanged(e) => Some(e.conversation_id),
            Self::MessageDeleted(e) => Some(e.conversation_id),
            Self::ReactionChanged(e) => Some(e.conversation_id),
            Self::ConversationUpdated(e) => Some(e.conversation_id),
            Self::TypingChanged(e) => Some(e.signal.conversation_id),
            Self::PresenceChanged(_) => None,
        }
    }

    pub fn message_created(message: Message) -> Self {
        Self::MessageCreated(MessageCreatedEvent {
            message,
            timestamp: Utc::now(),
        })
    }

    pub fn status_changed(message: &Message) -> Self {
        Self::MessageStatusChanged(MessageStatusChangedEvent {
            message_id: message.id,
            conversation_id: message.conversation_id,
            status: message.status,
            timestamp: message.updated_at,
        })
    }

    pub fn message_deleted(message: &Message) -> Self {
        Self::MessageDeleted(MessageDeletedEvent {
            message_id: message.id,
            conversation_id: message.conversation_id,
            timestamp: message.deleted_at.unwrap_or(message.updated_at),
        })
    }

    pub fn typing(signal: TypingSignal) -> Self {
        Self::TypingChanged(TypingChangedEvent {
            signal,
            timestamp: Utc::now(),
        })
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCreatedEvent {
    pub message: Message,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStatusChangedEvent {
    pub message_id: Snowflake,
    pub conversation_id: Snowflake,
    pub status: MessageStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeletedEvent {
    pub message_id: Snowflake,
    pub conversation_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionChangedEvent {
    pub message_id: Snowflake,
    pub conversation_id: Snowflake,
    pub user_id: Snowflake,
    pub emoji: String,
    /// true when the reaction was added, false when toggled off
    pub added: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationUpdatedEvent {
    pub conversation_id: Snowflake,
    pub last_message_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceChangedEvent {
    pub user_id: Snowflake,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingChangedEvent {
    pub signal: TypingSignal,
    pub timestamp: DateTime<Utc>,
}

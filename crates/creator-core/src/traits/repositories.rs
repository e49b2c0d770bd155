//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (PostgreSQL in production, an in-memory
//! store in tests).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Conversation, ConversationSummary, Message, Reaction, User};
use crate::error::DomainError;
use crate::value_objects::{MessageStatus, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>>;

    /// Find several users at once; unknown IDs are skipped
    async fn find_by_ids(&self, ids: &[Snowflake]) -> RepoResult<Vec<User>>;

    /// Create a new user
    async fn create(&self, user: &User) -> RepoResult<()>;

    /// Write the online flag together with a fresh last-seen time
    async fn set_presence(
        &self,
        id: Snowflake,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> RepoResult<()>;
}

// ============================================================================
// Conversation Repository
// ============================================================================

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Find conversation by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>>;

    /// Find the two-party conversation between two users
    async fn find_direct(&self, a: Snowflake, b: Snowflake) -> RepoResult<Option<Conversation>>;

    /// Create a new conversation with its participants
    async fn create(&self, conversation: &Conversation) -> RepoResult<()>;

    /// Bump `updated_at` (never moves it backwards)
    async fn touch(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<()>;

    /// Every conversation of a user with counterpart, last message, and pin
    /// state, fetched in a single round trip. Ordering is not guaranteed.
    async fn list_summaries(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationSummary>>;
}

// ============================================================================
// Message Repository
// ============================================================================

/// Pagination options for message queries
#[derive(Debug, Clone)]
pub struct MessageQuery {
    pub before: Option<Snowflake>,
    pub after: Option<Snowflake>,
    pub limit: i64,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
            limit: 50,
        }
    }
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID (soft-deleted messages included)
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>>;

    /// List live messages of a conversation, oldest first
    async fn find_by_conversation(
        &self,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>>;

    /// Create a new message
    async fn create(&self, message: &Message) -> RepoResult<()>;

    /// Conditionally move a message to `status`
    ///
    /// The write only happens when `status` is strictly ahead of the stored
    /// value. Returns the updated message, or `None` when nothing changed.
    async fn advance_status(
        &self,
        id: Snowflake,
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Message>>;

    /// Soft delete a message; returns false if it was already gone
    async fn soft_delete(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<bool>;
}

// ============================================================================
// Pin Repository
// ============================================================================

#[async_trait]
pub trait PinRepository: Send + Sync {
    /// Whether the user pinned the conversation
    async fn is_pinned(&self, user_id: Snowflake, conversation_id: Snowflake) -> RepoResult<bool>;

    /// Write the user's pin marker
    async fn set_pinned(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
        pinned: bool,
    ) -> RepoResult<()>;
}

// ============================================================================
// Reaction Repository
// ============================================================================

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Find reaction by message, user, and emoji
    async fn find(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> RepoResult<Option<Reaction>>;

    /// Get all reactions for a message, oldest first
    async fn find_by_message(&self, message_id: Snowflake) -> RepoResult<Vec<Reaction>>;

    /// Number of distinct emoji a user holds on a message
    async fn count_by_user(&self, message_id: Snowflake, user_id: Snowflake) -> RepoResult<i64>;

    /// Add a reaction
    async fn create(&self, reaction: &Reaction) -> RepoResult<()>;

    /// Remove a reaction
    async fn delete(&self, message_id: Snowflake, user_id: Snowflake, emoji: &str)
        -> RepoResult<()>;
}

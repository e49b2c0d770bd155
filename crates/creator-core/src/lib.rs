//! # creator-core
//!
//! Domain layer for creator messaging: entities, value objects, repository
//! and storage traits, and the events fanned out over realtime channels.
//! This crate has zero dependencies on infrastructure (database, pub/sub, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    count_reactions, describe_typers, sort_by_recent_activity, Conversation, ConversationSummary,
    LastMessage, Message, Reaction, ReactionCount, TypingSignal, TypingState, User,
    MAX_MESSAGE_LENGTH, MAX_REACTIONS_PER_USER,
};
pub use error::DomainError;
pub use events::DomainEvent;
pub use traits::{
    BlobStorage, ConversationRepository, MessageQuery, MessageRepository, PinRepository,
    ReactionRepository, RepoResult, UserRepository,
};
pub use value_objects::{MessageStatus, Snowflake, SnowflakeGenerator, SnowflakeParseError};

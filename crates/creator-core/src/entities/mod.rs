//! Domain entities - core business objects

mod conversation;
mod message;
mod reaction;
mod typing;
mod user;

pub use conversation::{sort_by_recent_activity, Conversation, ConversationSummary, LastMessage};
pub use message::{Message, MAX_MESSAGE_LENGTH};
pub use reaction::{count_reactions, Reaction, ReactionCount, MAX_REACTIONS_PER_USER};
pub use typing::{describe_typers, TypingSignal, TypingState};
pub use user::User;

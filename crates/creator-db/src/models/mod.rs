//! Database models - SQLx-compatible structs for PostgreSQL tables

mod conversation;
mod message;
mod reaction;
mod user;

pub use conversation::{ConversationModel, ConversationSummaryModel};
pub use message::MessageModel;
pub use reaction::ReactionModel;
pub use user::UserModel;

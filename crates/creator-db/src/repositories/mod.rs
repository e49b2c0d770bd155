//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in creator-core.

mod conversation;
mod error;
mod message;
mod pin;
mod reaction;
mod user;

pub use conversation::PgConversationRepository;
pub use message::PgMessageRepository;
pub use pin::PgPinRepository;
pub use reaction::PgReactionRepository;
pub use user::PgUserRepository;

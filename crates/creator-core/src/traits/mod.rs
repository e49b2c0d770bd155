mod repositories;
mod storage;

pub use repositories::{
    ConversationRepository, MessageQuery, MessageRepository, PinRepository, ReactionRepository,
    RepoResult, UserRepository,
};
pub use storage::BlobStorage;

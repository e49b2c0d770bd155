//! Messaging services
//!
//! Stateless services borrow a [`ServiceContext`] per call; the presence
//! tracker, typing broadcaster, conversation view, and facade own
//! background tasks and release them on drop.

pub mod context;
pub mod conversation;
pub mod error;
pub mod facade;
pub mod message;
pub mod notice;
pub mod presence;
pub mod reaction;
pub mod session;
pub mod status;
pub mod typing;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use conversation::ConversationService;
pub use error::{ServiceError, ServiceResult};
pub use facade::MessagingFacade;
pub use message::{sanitize_file_name, MessageService};
pub use notice::{Notice, NoticeCenter, NoticeLevel};
pub use presence::{PresenceTracker, SessionWatch};
pub use reaction::ReactionService;
pub use session::{AuthSession, Visibility};
pub use status::StatusService;
pub use typing::{TypingBroadcaster, TypingWatcher};
pub use view::{ConversationView, ViewState};

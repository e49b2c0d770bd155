//! # creator-messaging
//!
//! Realtime messaging for the creator platform: presence, typing signals,
//! message delivery status, the conversation list, and the facade a client
//! drives for one signed-in user.

pub mod dto;
pub mod services;

pub use dto::{
    AttachmentResponse, ConversationListItem, CreateGroupRequest, LastMessageResponse,
    MessageResponse, SendMessageRequest, ToggleReactionRequest, UploadAttachmentRequest,
};
pub use services::{
    AuthSession, ConversationService, ConversationView, MessageService, MessagingFacade, Notice,
    NoticeCenter, NoticeLevel, PresenceTracker, ReactionService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, StatusService, TypingBroadcaster,
    TypingWatcher, ViewState, Visibility,
};

//! Data transfer objects
//!
//! This module provides:
//! - Request DTOs with validation for inputs
//! - Response DTOs for rendering lists and messages
//! - Mappers from domain entities, relative to the viewing user

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    CreateGroupRequest, SendMessageRequest, ToggleReactionRequest, UploadAttachmentRequest,
};
pub use responses::{
    AttachmentResponse, ConversationListItem, LastMessageResponse, MessageResponse,
};

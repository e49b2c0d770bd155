//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("No active session")]
    NoSession,

    #[error("Not a participant of conversation {0}")]
    NotParticipant(Snowflake),

    #[error("Not message sender")]
    NotMessageSender,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Blob already exists: {0}")]
    BlobExists(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Realtime error: {0}")]
    RealtimeError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for client-facing notices
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::ConversationNotFound(_) => "UNKNOWN_CONVERSATION",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::BlobNotFound(_) => "UNKNOWN_BLOB",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidPath(_) => "INVALID_PATH",

            Self::NoSession => "NO_SESSION",
            Self::NotParticipant(_) => "NOT_PARTICIPANT",
            Self::NotMessageSender => "NOT_MESSAGE_SENDER",

            Self::BlobExists(_) => "BLOB_EXISTS",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::RealtimeError(_) => "REALTIME_ERROR",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::ConversationNotFound(_)
                | Self::MessageNotFound(_)
                | Self::BlobNotFound(_)
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::EmptyMessage
                | Self::ContentTooLong { .. }
                | Self::InvalidPath(_)
        )
    }

    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::NoSession | Self::NotParticipant(_) | Self::NotMessageSender
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::BlobExists(_))
    }

    /// Network or storage failure that may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::RealtimeError(_) | Self::StorageError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::MessageNotFound(Snowflake::new(1)).code(), "UNKNOWN_MESSAGE");
        assert_eq!(DomainError::NoSession.code(), "NO_SESSION");
    }

    #[test]
    fn test_categories() {
        assert!(DomainError::ConversationNotFound(Snowflake::new(1)).is_not_found());
        assert!(DomainError::NotMessageSender.is_authorization());
        assert!(DomainError::EmptyMessage.is_validation());
        assert!(DomainError::DatabaseError("timeout".into()).is_transient());
        assert!(!DomainError::NotMessageSender.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::ContentTooLong { max: 4000 };
        assert_eq!(err.to_string(), "Content too long: max 4000 characters");
    }
}

//! Request DTOs
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::{Validate, ValidationError};

// ============================================================================
// Message Requests
// ============================================================================

/// Send message request
///
/// Either non-blank content or an attachment is required.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_message_body"))]
pub struct SendMessageRequest {
    #[serde(default)]
    #[validate(length(max = 4000, message = "Message must be at most 4000 characters"))]
    pub content: String,

    /// Public URL or storage path of an uploaded attachment
    #[validate(length(min = 1, max = 1024, message = "Attachment reference must be 1-1024 characters"))]
    pub attachment: Option<String>,
}

impl SendMessageRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }
}

fn validate_message_body(request: &SendMessageRequest) -> Result<(), ValidationError> {
    if request.content.trim().is_empty() && request.attachment.is_none() {
        let mut err = ValidationError::new("empty_message");
        err.message = Some("Message is empty".into());
        return Err(err);
    }
    Ok(())
}

/// Attachment upload request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadAttachmentRequest {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: String,
}

// ============================================================================
// Conversation Requests
// ============================================================================

/// Create group request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Group name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "A group needs at least one other member"))]
    pub members: Vec<String>,
}

// ============================================================================
// Reaction Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToggleReactionRequest {
    #[validate(length(min = 1, max = 64, message = "Emoji must be 1-64 characters"))]
    pub emoji: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use creator_core::MAX_MESSAGE_LENGTH;

    #[test]
    fn test_send_message_validation() {
        assert!(SendMessageRequest::text("hi").validate().is_ok());
        assert!(SendMessageRequest::text("   ").validate().is_err());
        assert!(SendMessageRequest::text("")
            .with_attachment("https://cdn/a.png")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_length_is_counted_in_characters() {
        let at_limit = "é".repeat(MAX_MESSAGE_LENGTH);
        assert!(SendMessageRequest::text(at_limit).validate().is_ok());

        let over = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(SendMessageRequest::text(over).validate().is_err());
    }

    #[test]
    fn test_deserialize_without_content() {
        let request: SendMessageRequest =
            serde_json::from_str(r#"{"attachment":"uploads/a.png"}"#).unwrap();
        assert!(request.content.is_empty());
        assert!(request.validate().is_ok());
    }
}

//! Application error types
//!
//! Unified error handling above the domain layer. Errors that reach the user
//! are rendered as notices through [`AppError::user_message`].

use creator_core::DomainError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Session errors
    #[error("No signed-in user")]
    NoSession,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Realtime error: {0}")]
    Realtime(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get error code for notices and logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoSession => "NO_SESSION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Realtime(_) => "REALTIME_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// The caller can fix this by changing the input
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::NoSession | Self::Validation(_) | Self::NotFound(_) | Self::Forbidden(_) => true,
            Self::Domain(e) => e.is_validation() || e.is_not_found() || e.is_authorization(),
            _ => false,
        }
    }

    /// The same request may succeed if repeated later
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(_) | Self::Realtime(_) | Self::Storage(_) => true,
            Self::Domain(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Short text suitable for a dismissible notice
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_user_error() {
            self.to_string()
        } else if self.is_retryable() {
            "Something went wrong. Please try again.".to_string()
        } else {
            "Unexpected error.".to_string()
        }
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

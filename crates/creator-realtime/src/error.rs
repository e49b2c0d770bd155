//! Realtime error types.

use creator_core::DomainError;

use crate::pool::RedisPoolError;

/// Error type for realtime transport operations
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("Redis pool error: {0}")]
    Pool(#[from] RedisPoolError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to encode or decode event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    #[error("Listener channel closed")]
    ChannelClosed,
}

/// Result type for realtime operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

impl From<RealtimeError> for DomainError {
    fn from(err: RealtimeError) -> Self {
        DomainError::RealtimeError(err.to_string())
    }
}

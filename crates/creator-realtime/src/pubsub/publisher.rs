//! Redis Pub/Sub publisher.
//!
//! Serializes domain events and publishes them to Redis channels.

use creator_core::DomainEvent;
use redis::AsyncCommands;

use crate::error::RealtimeResult;
use crate::pool::RedisPool;
use crate::pubsub::RealtimeChannel;

/// Redis Pub/Sub publisher
#[derive(Debug, Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel, returning the number of Redis subscribers
    pub async fn publish(&self, channel: &RealtimeChannel, event: &DomainEvent) -> RealtimeResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = encode(event)?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = event.event_type(),
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }
}

pub(crate) fn encode(event: &DomainEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub(crate) fn decode(payload: &str) -> serde_json::Result<DomainEvent> {
    serde_json::from_str(payload)
}

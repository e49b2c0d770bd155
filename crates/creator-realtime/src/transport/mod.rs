//! Realtime transport abstraction and its implementations.

mod memory;
mod redis_transport;
mod registry;
mod subscription;

use async_trait::async_trait;
use creator_core::DomainEvent;

use crate::error::RealtimeResult;
use crate::pubsub::RealtimeChannel;

pub(crate) use registry::ChannelRegistry;
pub use memory::MemoryTransport;
pub use redis_transport::RedisTransport;
pub use subscription::Subscription;

/// Publish/subscribe fan-out of domain events
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Publish an event, returning the number of receivers reached
    async fn publish(&self, channel: &RealtimeChannel, event: &DomainEvent) -> RealtimeResult<usize>;

    /// Open a scoped subscription to a channel
    async fn subscribe(&self, channel: &RealtimeChannel) -> RealtimeResult<Subscription>;
}

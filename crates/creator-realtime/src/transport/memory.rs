//! In-process transport for single-node deployments and tests.

use std::sync::Arc;

use async_trait::async_trait;
use creator_core::DomainEvent;

use super::registry::ChannelRegistry;
use super::{RealtimeTransport, Subscription};
use crate::error::RealtimeResult;
use crate::pubsub::RealtimeChannel;

/// Transport backed by `tokio::sync::broadcast` channels
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    registry: Arc<ChannelRegistry>,
}

impl MemoryTransport {
    /// Create a transport whose channels buffer `buffer` events each
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(ChannelRegistry::new(buffer)),
        }
    }

    /// Channels with at least one live subscription
    #[must_use]
    pub fn active_channels(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Live subscriptions on a channel
    #[must_use]
    pub fn subscriber_count(&self, channel: &RealtimeChannel) -> usize {
        self.registry.receiver_count(&channel.name())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl RealtimeTransport for MemoryTransport {
    async fn publish(&self, channel: &RealtimeChannel, event: &DomainEvent) -> RealtimeResult<usize> {
        let receivers = self.registry.deliver(&channel.name(), event.clone());
        tracing::debug!(
            channel = %channel,
            event_type = event.event_type(),
            receivers,
            "Published event"
        );
        Ok(receivers)
    }

    async fn subscribe(&self, channel: &RealtimeChannel) -> RealtimeResult<Subscription> {
        let name = channel.name();
        let (rx, _) = self.registry.attach(&name);
        let registry = Arc::clone(&self.registry);
        Ok(Subscription::new(channel.clone(), rx, move || {
            registry.release(&name);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creator_core::{Snowflake, TypingSignal};

    fn typing(conversation: i64, user: i64, is_typing: bool) -> DomainEvent {
        DomainEvent::typing(TypingSignal {
            conversation_id: Snowflake::new(conversation),
            user_id: Snowflake::new(user),
            username: format!("user{user}"),
            avatar: None,
            is_typing,
        })
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber_in_order() {
        let transport = MemoryTransport::default();
        let channel = RealtimeChannel::typing(Snowflake::new(1));
        let mut a = transport.subscribe(&channel).await.unwrap();
        let mut b = transport.subscribe(&channel).await.unwrap();

        let started = typing(1, 7, true);
        let stopped = typing(1, 7, false);
        assert_eq!(transport.publish(&channel, &started).await.unwrap(), 2);
        assert_eq!(transport.publish(&channel, &stopped).await.unwrap(), 2);

        for sub in [&mut a, &mut b] {
            assert_eq!(sub.recv().await.as_ref(), Some(&started));
            assert_eq!(sub.recv().await.as_ref(), Some(&stopped));
        }
    }

    #[tokio::test]
    async fn test_channels_are_isolated() {
        let transport = MemoryTransport::default();
        let mut other = transport
            .subscribe(&RealtimeChannel::typing(Snowflake::new(2)))
            .await
            .unwrap();

        let reached = transport
            .publish(&RealtimeChannel::typing(Snowflake::new(1)), &typing(1, 7, true))
            .await
            .unwrap();
        assert_eq!(reached, 0);
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_channel() {
        let transport = MemoryTransport::default();
        let channel = RealtimeChannel::messages(Snowflake::new(5));

        let first = transport.subscribe(&channel).await.unwrap();
        let second = transport.subscribe(&channel).await.unwrap();
        assert_eq!(transport.subscriber_count(&channel), 2);

        drop(first);
        assert_eq!(transport.active_channels(), vec!["messages:5".to_string()]);

        drop(second);
        assert!(transport.active_channels().is_empty());
    }
}

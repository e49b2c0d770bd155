//! Redis-backed transport for multi-node deployments.

use std::sync::Arc;

use async_trait::async_trait;
use creator_common::{RealtimeConfig, RedisConfig};
use creator_core::DomainEvent;

use super::registry::ChannelRegistry;
use super::{RealtimeTransport, Subscription};
use crate::error::RealtimeResult;
use crate::pool::RedisPool;
use crate::pubsub::{Publisher, RealtimeChannel, Subscriber, SubscriberConfig};

/// Transport that publishes through Redis and fans incoming events out locally
///
/// One Redis subscription is held per channel no matter how many local
/// subscribers it has; the last local drop unsubscribes.
#[derive(Debug)]
pub struct RedisTransport {
    pool: RedisPool,
    publisher: Publisher,
    subscriber: Subscriber,
    registry: Arc<ChannelRegistry>,
}

impl RedisTransport {
    /// Start the listener; must be called inside a Tokio runtime
    #[must_use]
    pub fn connect(pool: RedisPool, config: SubscriberConfig, buffer: usize) -> Self {
        let registry = Arc::new(ChannelRegistry::new(buffer));
        let subscriber = Subscriber::spawn(config, Arc::clone(&registry));
        Self {
            publisher: Publisher::new(pool.clone()),
            pool,
            subscriber,
            registry,
        }
    }

    /// Build pool and listener from application config
    pub fn from_config(redis: &RedisConfig, realtime: &RealtimeConfig) -> RealtimeResult<Self> {
        let pool = RedisPool::from_config(redis)?;
        let config = SubscriberConfig {
            redis_url: redis.url.clone(),
            ..SubscriberConfig::default()
        };
        Ok(Self::connect(pool, config, realtime.buffer))
    }

    /// Ping Redis through the publishing pool
    pub async fn health_check(&self) -> RealtimeResult<()> {
        self.pool.health_check().await?;
        Ok(())
    }

    /// Channels the Redis connection is subscribed to
    pub async fn subscribed_channels(&self) -> Vec<String> {
        self.subscriber.subscribed_channels().await
    }

    /// Stop the background listener
    pub async fn shutdown(&self) -> RealtimeResult<()> {
        self.subscriber.shutdown().await
    }
}

#[async_trait]
impl RealtimeTransport for RedisTransport {
    async fn publish(&self, channel: &RealtimeChannel, event: &DomainEvent) -> RealtimeResult<usize> {
        let receivers = self.publisher.publish(channel, event).await?;
        Ok(receivers as usize)
    }

    async fn subscribe(&self, channel: &RealtimeChannel) -> RealtimeResult<Subscription> {
        let name = channel.name();
        let (rx, created) = self.registry.attach(&name);

        if created {
            if let Err(e) = self.subscriber.subscribe(name.clone()).await {
                drop(rx);
                self.registry.release(&name);
                return Err(e);
            }
        }

        let registry = Arc::clone(&self.registry);
        let control = self.subscriber.control();
        Ok(Subscription::new(channel.clone(), rx, move || {
            if registry.release(&name) {
                control.unsubscribe_later(name);
            }
        }))
    }
}

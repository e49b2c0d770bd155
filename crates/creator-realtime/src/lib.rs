//! # creator-realtime
//!
//! Realtime fan-out of domain events over named channels.
//!
//! ## Features
//!
//! - **Channels**: per-conversation message and typing channels, a global
//!   presence channel, and per-user channels
//! - **Transports**: Redis Pub/Sub across nodes, `tokio::sync::broadcast`
//!   in-process
//! - **Subscriptions**: scoped handles that release the channel on drop
//!
//! ## Example
//!
//! ```ignore
//! use creator_realtime::{MemoryTransport, RealtimeChannel, RealtimeTransport};
//!
//! let transport = MemoryTransport::default();
//! let mut sub = transport.subscribe(&RealtimeChannel::messages(conversation_id)).await?;
//! transport.publish(&RealtimeChannel::messages(conversation_id), &event).await?;
//! let received = sub.recv().await;
//! ```

pub mod error;
pub mod pool;
pub mod pubsub;
pub mod transport;

pub use error::{RealtimeError, RealtimeResult};
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
pub use pubsub::{
    Publisher, RealtimeChannel, SubscriberConfig, MESSAGES_CHANNEL_PREFIX, PRESENCE_CHANNEL,
    TYPING_CHANNEL_PREFIX, USER_CHANNEL_PREFIX,
};
pub use transport::{MemoryTransport, RealtimeTransport, RedisTransport, Subscription};

//! Channel naming and the Redis Pub/Sub plumbing.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{
    RealtimeChannel, MESSAGES_CHANNEL_PREFIX, PRESENCE_CHANNEL, TYPING_CHANNEL_PREFIX,
    USER_CHANNEL_PREFIX,
};
pub use publisher::Publisher;
pub(crate) use subscriber::Subscriber;
pub use subscriber::SubscriberConfig;

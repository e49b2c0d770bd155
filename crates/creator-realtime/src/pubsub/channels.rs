//! Realtime channel definitions.
//!
//! Defines the channel naming conventions shared by every transport.

use creator_core::Snowflake;

/// Channel prefix for message row changes of one conversation
pub const MESSAGES_CHANNEL_PREFIX: &str = "messages:";
/// Channel prefix for ephemeral typing signals of one conversation
pub const TYPING_CHANNEL_PREFIX: &str = "typing:";
/// Channel prefix for user-specific events
pub const USER_CHANNEL_PREFIX: &str = "user:";
/// Global presence channel
pub const PRESENCE_CHANNEL: &str = "presence";

/// Realtime channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RealtimeChannel {
    /// Message created / status changed / deleted / reactions of a conversation
    Messages(Snowflake),
    /// Typing signals of a conversation, never persisted
    Typing(Snowflake),
    /// Online flag changes of every user
    Presence,
    /// Events for a specific user (conversation list updates)
    User(Snowflake),
    /// Custom channel name
    Custom(String),
}

impl RealtimeChannel {
    #[must_use]
    pub fn messages(conversation_id: Snowflake) -> Self {
        Self::Messages(conversation_id)
    }

    #[must_use]
    pub fn typing(conversation_id: Snowflake) -> Self {
        Self::Typing(conversation_id)
    }

    #[must_use]
    pub fn presence() -> Self {
        Self::Presence
    }

    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// Create a custom channel
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Signals on this channel are not backed by any stored row
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Typing(_))
    }

    /// Get the wire channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Messages(id) => format!("{MESSAGES_CHANNEL_PREFIX}{id}"),
            Self::Typing(id) => format!("{TYPING_CHANNEL_PREFIX}{id}"),
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
            Self::Presence => PRESENCE_CHANNEL.to_string(),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `RealtimeChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == PRESENCE_CHANNEL {
            return Self::Presence;
        }

        let prefixed: [(&str, fn(Snowflake) -> Self); 3] = [
            (MESSAGES_CHANNEL_PREFIX, Self::Messages),
            (TYPING_CHANNEL_PREFIX, Self::Typing),
            (USER_CHANNEL_PREFIX, Self::User),
        ];
        for (prefix, build) in prefixed {
            if let Some(id) = name.strip_prefix(prefix).and_then(|s| s.parse::<Snowflake>().ok()) {
                return build(id);
            }
        }

        Self::Custom(name.to_string())
    }
}

impl std::fmt::Display for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        let conversation_id = Snowflake::from(12345i64);
        let user_id = Snowflake::from(11111i64);

        assert_eq!(RealtimeChannel::messages(conversation_id).name(), "messages:12345");
        assert_eq!(RealtimeChannel::typing(conversation_id).name(), "typing:12345");
        assert_eq!(RealtimeChannel::user(user_id).name(), "user:11111");
        assert_eq!(RealtimeChannel::presence().name(), "presence");
        assert_eq!(RealtimeChannel::custom("test").name(), "test");
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(
            RealtimeChannel::parse("messages:12345"),
            RealtimeChannel::Messages(Snowflake::from(12345i64))
        );
        assert_eq!(
            RealtimeChannel::parse("typing:67890"),
            RealtimeChannel::Typing(Snowflake::from(67890i64))
        );
        assert_eq!(
            RealtimeChannel::parse("user:11111"),
            RealtimeChannel::User(Snowflake::from(11111i64))
        );
        assert_eq!(RealtimeChannel::parse("presence"), RealtimeChannel::Presence);
        assert_eq!(
            RealtimeChannel::parse("typing:abc"),
            RealtimeChannel::Custom("typing:abc".to_string())
        );
    }

    #[test]
    fn test_only_typing_is_ephemeral() {
        assert!(RealtimeChannel::typing(Snowflake::new(1)).is_ephemeral());
        assert!(!RealtimeChannel::messages(Snowflake::new(1)).is_ephemeral());
        assert!(!RealtimeChannel::presence().is_ephemeral());
    }
}

mod domain_event;

pub use domain_event::{
    ConversationUpdatedEvent, DomainEvent, MessageCreatedEvent, MessageDeletedEvent,
    MessageStatusChangedEvent, PresenceChangedEvent, ReactionChangedEvent, TypingChangedEvent,
};

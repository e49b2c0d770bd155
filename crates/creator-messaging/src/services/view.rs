//! Open conversation view
//!
//! Everything held while one conversation is on screen: its messages and
//! reactions, the message-channel listener, and typing in both directions.
//! Dropping the view releases all of it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use creator_core::traits::MessageQuery;
use creator_core::{
    Conversation, DomainError, DomainEvent, Message, MessageStatus, Reaction, Snowflake, User,
};
use creator_realtime::{RealtimeChannel, Subscription};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::context::ServiceContext;
use super::conversation::ConversationService;
use super::error::ServiceResult;
use super::session::Visibility;
use super::status::StatusService;
use super::typing::{TypingBroadcaster, TypingWatcher};

/// Local copy of an open conversation, reconciled from realtime events
#[derive(Debug, Default, Clone)]
pub struct ViewState {
    conversation_id: Snowflake,
    messages: Vec<Message>,
    reactions: HashMap<Snowflake, Vec<Reaction>>,
}

impl ViewState {
    pub fn new(conversation_id: Snowflake, messages: Vec<Message>) -> Self {
        let mut state = Self {
            conversation_id,
            ..Self::default()
        };
        for message in messages {
            state.insert(message);
        }
        state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn reactions(&self, message_id: Snowflake) -> &[Reaction] {
        self.reactions.get(&message_id).map_or(&[], Vec::as_slice)
    }

    /// Insert in id order; returns false when the message is already present
    pub fn insert(&mut self, message: Message) -> bool {
        if message.conversation_id != self.conversation_id || message.is_deleted() {
            return false;
        }
        match self.messages.binary_search_by_key(&message.id, |m| m.id) {
            Ok(_) => false,
            Err(idx) => {
                self.messages.insert(idx, message);
                true
            }
        }
    }

    pub fn remove(&mut self, message_id: Snowflake) -> Option<Message> {
        self.reactions.remove(&message_id);
        let idx = self.messages.iter().position(|m| m.id == message_id)?;
        Some(self.messages.remove(idx))
    }

    /// Forward-only; returns true when the local copy moved
    pub fn apply_status(&mut self, message_id: Snowflake, status: MessageStatus, at: DateTime<Utc>) -> bool {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .is_some_and(|m| m.apply_status(status, at))
    }

    pub fn set_reactions(&mut self, message_id: Snowflake, reactions: Vec<Reaction>) {
        if reactions.is_empty() {
            self.reactions.remove(&message_id);
        } else {
            self.reactions.insert(message_id, reactions);
        }
    }

    pub fn apply_reaction(&mut self, message_id: Snowflake, user_id: Snowflake, emoji: &str, added: bool) {
        let list = self.reactions.entry(message_id).or_default();
        let present = list.iter().any(|r| r.user_id == user_id && r.is_emoji(emoji));
        if added && !present {
            list.push(Reaction::new(message_id, user_id, emoji));
        } else if !added {
            list.retain(|r| !(r.user_id == user_id && r.is_emoji(emoji)));
        }
        if list.is_empty() {
            self.reactions.remove(&message_id);
        }
    }

    /// Reconcile one event; returns a message that was new to this view
    pub fn apply(&mut self, event: &DomainEvent) -> Option<Message> {
        if event.conversation_id() != Some(self.conversation_id) {
            return None;
        }
        match event {
            DomainEvent::MessageCreated(e) => {
                self.insert(e.message.clone()).then(|| e.message.clone())
            }
            DomainEvent::MessageStatusChanged(e) => {
                self.apply_status(e.message_id, e.status, e.timestamp);
                None
            }
            DomainEvent::MessageDeleted(e) => {
                self.remove(e.message_id);
                None
            }
            DomainEvent::ReactionChanged(e) => {
                self.apply_reaction(e.message_id, e.user_id, &e.emoji, e.added);
                None
            }
            _ => None,
        }
    }
}

/// Resources held while a conversation is open
pub struct ConversationView {
    conversation: Conversation,
    state: Arc<Mutex<ViewState>>,
    typing: TypingBroadcaster,
    watcher: TypingWatcher,
    listener: JoinHandle<()>,
}

impl ConversationView {
    /// Subscribe, load the latest page, and send receipts for it
    #[instrument(skip(ctx, viewer, foreground), fields(viewer = %viewer.id))]
    pub async fn open(
        ctx: &ServiceContext,
        viewer: &User,
        conversation_id: Snowflake,
        foreground: Arc<AtomicBool>,
    ) -> ServiceResult<Self> {
        let conversation = ConversationService::new(ctx)
            .require_participant(conversation_id, viewer.id)
            .await?;

        // Subscribe before loading so nothing sent in between is missed
        let subscription = ctx
            .transport()
            .subscribe(&RealtimeChannel::messages(conversation_id))
            .await
            .map_err(DomainError::from)?;
        let watcher = TypingWatcher::subscribe(ctx.transport().as_ref(), conversation_id).await?;

        let messages = ctx
            .message_repo()
            .find_by_conversation(conversation_id, MessageQuery::default())
            .await?;
        let mut state = ViewState::new(conversation_id, messages);
        for message_id in state.messages().iter().map(|m| m.id).collect::<Vec<_>>() {
            let reactions = ctx.reaction_repo().find_by_message(message_id).await?;
            state.set_reactions(message_id, reactions);
        }
        debug!(messages = state.messages().len(), "Conversation loaded");
        let state = Arc::new(Mutex::new(state));

        let loaded = state.lock().messages().to_vec();
        let visibility = Visibility::from_foreground(foreground.load(Ordering::SeqCst));
        send_receipts(ctx, viewer.id, &state, &loaded, visibility).await;

        let listener = tokio::spawn(listen(
            ctx.clone(),
            viewer.id,
            subscription,
            Arc::clone(&state),
            foreground,
        ));

        Ok(Self {
            conversation,
            state,
            typing: TypingBroadcaster::new(ctx.transport(), conversation_id, viewer, ctx.typing_idle()),
            watcher,
            listener,
        })
    }

    pub fn conversation_id(&self) -> Snowflake {
        self.conversation.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Snapshot of the local messages, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages().to_vec()
    }

    pub fn reactions(&self, message_id: Snowflake) -> Vec<Reaction> {
        self.state.lock().reactions(message_id).to_vec()
    }

    pub fn typing(&self) -> &TypingBroadcaster {
        &self.typing
    }

    pub fn watcher(&self) -> &TypingWatcher {
        &self.watcher
    }

    pub(crate) fn state(&self) -> &Arc<Mutex<ViewState>> {
        &self.state
    }
}

impl Drop for ConversationView {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Delivered for everything received; read as well when in the foreground
pub(crate) async fn send_receipts(
    ctx: &ServiceContext,
    viewer: Snowflake,
    state: &Mutex<ViewState>,
    messages: &[Message],
    visibility: Visibility,
) {
    let status = StatusService::new(ctx);

    match status.mark_delivered(viewer, messages).await {
        Ok(updated) => apply_updates(state, &updated),
        Err(e) => warn!(error = %e, "Failed to mark messages delivered"),
    }

    let current: Vec<Message> = {
        let state = state.lock();
        messages
            .iter()
            .filter_map(|m| state.messages().iter().find(|s| s.id == m.id).cloned())
            .collect()
    };
    match status.mark_read(viewer, &current, visibility).await {
        Ok(updated) => apply_updates(state, &updated),
        Err(e) => warn!(error = %e, "Failed to mark messages read"),
    }
}

fn apply_updates(state: &Mutex<ViewState>, updated: &[Message]) {
    let mut state = state.lock();
    for message in updated {
        state.apply_status(message.id, message.status, message.updated_at);
    }
}

async fn listen(
    ctx: ServiceContext,
    viewer: Snowflake,
    mut subscription: Subscription,
    state: Arc<Mutex<ViewState>>,
    foreground: Arc<AtomicBool>,
) {
    while let Some(event) = subscription.recv().await {
        let incoming = state.lock().apply(&event);
        if let Some(message) = incoming.filter(|m| !m.is_from(viewer)) {
            let visibility = Visibility::from_foreground(foreground.load(Ordering::SeqCst));
            send_receipts(&ctx, viewer, &state, &[message], visibility).await;
        }
    }
    debug!(channel = %subscription.channel(), "Message listener stopped");
}

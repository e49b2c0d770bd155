//! Messaging facade
//!
//! Composition root for one signed-in user: the conversation list, the
//! open conversation, presence, and typing, behind one object a client
//! drives. Transient failures end up as notices, never as errors.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use creator_core::traits::MessageQuery;
use creator_core::{
    sort_by_recent_activity, ConversationSummary, DomainError, DomainEvent, LastMessage, Message,
    ReactionCount, Snowflake, User, count_reactions,
};
use creator_realtime::{RealtimeChannel, Subscription};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::dto::{
    AttachmentResponse, ConversationListItem, MessageResponse, SendMessageRequest,
    UploadAttachmentRequest,
};

use super::context::ServiceContext;
use super::conversation::ConversationService;
use super::error::{ServiceError, ServiceResult};
use super::message::MessageService;
use super::notice::NoticeCenter;
use super::presence::{PresenceTracker, SessionWatch};
use super::reaction::ReactionService;
use super::session::{AuthSession, Visibility};
use super::view::{send_receipts, ConversationView};

type SummaryCache = Arc<Mutex<Vec<ConversationSummary>>>;

/// Messaging facade for the signed-in user
pub struct MessagingFacade {
    ctx: ServiceContext,
    session: AuthSession,
    presence: PresenceTracker,
    conversations: SummaryCache,
    view: tokio::sync::Mutex<Option<ConversationView>>,
    foreground: Arc<AtomicBool>,
    loading: Arc<AtomicUsize>,
    background: Vec<JoinHandle<()>>,
    _session_watch: SessionWatch,
}

impl MessagingFacade {
    /// Start the facade for the session's current user
    ///
    /// Marks the user online, follows the session, and listens for
    /// presence and conversation-list updates.
    #[instrument(skip_all)]
    pub async fn start(ctx: ServiceContext, session: AuthSession) -> ServiceResult<Self> {
        let user = session.current_user().ok_or(ServiceError::NoSession)?;
        let presence = PresenceTracker::new(ctx.clone(), session.clone());
        let session_watch = presence.watch_session();
        let conversations: SummaryCache = Arc::default();

        let presence_events = subscribe(&ctx, &RealtimeChannel::presence()).await?;
        let inbox = subscribe(&ctx, &RealtimeChannel::user(user.id)).await?;
        let background = vec![
            tokio::spawn(follow_presence(presence_events, Arc::clone(&conversations))),
            tokio::spawn(follow_inbox(ctx.clone(), user.id, inbox, Arc::clone(&conversations))),
        ];

        info!(user_id = %user.id, "Messaging started");
        Ok(Self {
            ctx,
            session,
            presence,
            conversations,
            view: tokio::sync::Mutex::new(None),
            foreground: Arc::new(AtomicBool::new(true)),
            loading: Arc::new(AtomicUsize::new(0)),
            background,
            _session_watch: session_watch,
        })
    }

    fn viewer(&self) -> ServiceResult<User> {
        self.session.current_user().ok_or(ServiceError::NoSession)
    }

    /// Transient failures become a notice and the default value
    fn absorb<T: Default>(&self, result: ServiceResult<T>) -> ServiceResult<T> {
        match result {
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Operation failed");
                self.ctx.notices().from_error(&e);
                Ok(T::default())
            }
            other => other,
        }
    }

    pub fn notices(&self) -> &NoticeCenter {
        self.ctx.notices()
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// True while any load is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_foreground(self.foreground.load(Ordering::SeqCst))
    }

    // =========================================================================
    // Conversation list
    // =========================================================================

    /// Reload the conversation list
    pub async fn list_conversations(&self) -> Vec<ConversationSummary> {
        let Ok(user) = self.viewer() else {
            return Vec::new();
        };
        let _loading = LoadingGuard::new(&self.loading);
        let list = ConversationService::new(&self.ctx)
            .list_conversations(user.id)
            .await;
        self.conversations.lock().clone_from(&list);
        list
    }

    /// Last loaded conversation list
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.conversations.lock().clone()
    }

    pub fn conversation_items(&self) -> Vec<ConversationListItem> {
        let Some(viewer) = self.session.user_id() else {
            return Vec::new();
        };
        self.conversations
            .lock()
            .iter()
            .map(|s| ConversationListItem::from_summary(s, viewer))
            .collect()
    }

    pub async fn toggle_pin_conversation(&self, conversation_id: Snowflake) -> bool {
        let Some(user_id) = self.session.user_id() else {
            return false;
        };
        let pinned = ConversationService::new(&self.ctx)
            .toggle_pin(user_id, conversation_id)
            .await;
        if let Some(summary) = self
            .conversations
            .lock()
            .iter_mut()
            .find(|s| s.conversation.id == conversation_id)
        {
            summary.pinned = pinned;
        }
        pinned
    }

    /// Open (creating if needed) the conversation with another user
    pub async fn open_direct(&self, other_id: Snowflake) -> ServiceResult<Snowflake> {
        let user = self.viewer()?;
        let conversation = ConversationService::new(&self.ctx)
            .find_or_create_direct(user.id, other_id)
            .await?;
        self.set_current_conversation(Some(conversation.id)).await?;
        Ok(conversation.id)
    }

    // =========================================================================
    // Current conversation
    // =========================================================================

    /// Switch the open conversation; `None` closes it
    #[instrument(skip(self))]
    pub async fn set_current_conversation(&self, conversation_id: Option<Snowflake>) -> ServiceResult<()> {
        let user = self.viewer()?;
        let mut slot = self.view.lock().await;

        if let Some(previous) = slot.take() {
            previous.typing().stop_typing().await;
            debug!(conversation_id = %previous.conversation_id(), "Conversation closed");
        }
        let Some(conversation_id) = conversation_id else {
            return Ok(());
        };

        let _loading = LoadingGuard::new(&self.loading);
        match ConversationView::open(&self.ctx, &user, conversation_id, Arc::clone(&self.foreground)).await {
            Ok(view) => {
                *slot = Some(view);
                Ok(())
            }
            Err(e) => {
                if e.is_transient() {
                    self.ctx.notices().from_error(&e);
                }
                Err(e)
            }
        }
    }

    pub async fn current_conversation(&self) -> Option<Snowflake> {
        self.view.lock().await.as_ref().map(ConversationView::conversation_id)
    }

    /// Messages of the open conversation, oldest first
    pub async fn messages(&self) -> Vec<Message> {
        self.view
            .lock()
            .await
            .as_ref()
            .map(ConversationView::messages)
            .unwrap_or_default()
    }

    pub async fn message_items(&self) -> Vec<MessageResponse> {
        let Some(viewer) = self.session.user_id() else {
            return Vec::new();
        };
        let slot = self.view.lock().await;
        let Some(view) = slot.as_ref() else {
            return Vec::new();
        };
        view.messages()
            .iter()
            .map(|m| MessageResponse::from_message(m, &view.reactions(m.id), viewer))
            .collect()
    }

    pub async fn reactions(&self, message_id: Snowflake) -> Vec<ReactionCount> {
        let Some(viewer) = self.session.user_id() else {
            return Vec::new();
        };
        self.view
            .lock()
            .await
            .as_ref()
            .map(|v| count_reactions(&v.reactions(message_id), viewer))
            .unwrap_or_default()
    }

    /// Load the page before the oldest loaded message; returns how many arrived
    pub async fn load_older(&self) -> ServiceResult<usize> {
        let user = self.viewer()?;
        let slot = self.view.lock().await;
        let Some(view) = slot.as_ref() else {
            return Ok(0);
        };
        let before = view.messages().first().map(|m| m.id);
        let _loading = LoadingGuard::new(&self.loading);

        let result = MessageService::new(&self.ctx)
            .get_messages(
                user.id,
                view.conversation_id(),
                MessageQuery {
                    before,
                    ..MessageQuery::default()
                },
            )
            .await;
        let page = self.absorb(result)?;

        let mut state = view.state().lock();
        Ok(page.into_iter().filter(|m| state.insert(m.clone())).count())
    }

    /// Send to the open conversation
    ///
    /// The message shows up locally right away and is withdrawn again if it
    /// cannot be stored. Returns `None` when storing failed transiently.
    #[instrument(skip(self, content, attachment))]
    pub async fn send_message(
        &self,
        content: impl Into<String>,
        attachment: Option<String>,
    ) -> ServiceResult<Option<Message>> {
        let user = self.viewer()?;
        let slot = self.view.lock().await;
        let view = slot
            .as_ref()
            .ok_or_else(|| ServiceError::validation("No conversation is open"))?;

        let service = MessageService::new(&self.ctx);
        let message = service.compose(
            user.id,
            view.conversation_id(),
            SendMessageRequest {
                content: content.into(),
                attachment,
            },
        )?;

        view.state().lock().insert(message.clone());
        view.typing().stop_typing().await;

        if let Err(e) = service.persist(&message).await {
            view.state().lock().remove(message.id);
            warn!(error = %e, "Message withdrawn");
            self.ctx.notices().from_error(&e);
            return if e.is_transient() { Ok(None) } else { Err(e) };
        }

        self.record_sent(&message);
        Ok(Some(message))
    }

    /// Sender-only soft delete
    ///
    /// Returns `false` when storage failed transiently; the message then
    /// stays in the view.
    pub async fn delete_message(&self, message_id: Snowflake) -> ServiceResult<bool> {
        let user = self.viewer()?;
        let result = MessageService::new(&self.ctx)
            .delete_message(user.id, message_id)
            .await
            .map(|()| true);
        let deleted = self.absorb(result)?;

        if deleted {
            if let Some(view) = self.view.lock().await.as_ref() {
                view.state().lock().remove(message_id);
            }
        }
        Ok(deleted)
    }

    /// Toggle a reaction; `None` when nothing changed
    pub async fn toggle_reaction(&self, message_id: Snowflake, emoji: &str) -> ServiceResult<Option<bool>> {
        let user = self.viewer()?;
        let result = ReactionService::new(&self.ctx)
            .toggle_reaction(user.id, message_id, emoji)
            .await;
        let toggled = self.absorb(result)?;

        if let (Some(added), Some(view)) = (toggled, self.view.lock().await.as_ref()) {
            view.state().lock().apply_reaction(message_id, user.id, emoji.trim(), added);
        }
        Ok(toggled)
    }

    /// Store a file for use as an attachment; `None` when storage failed
    pub async fn upload_attachment(
        &self,
        file_name: impl Into<String>,
        bytes: &[u8],
    ) -> ServiceResult<Option<AttachmentResponse>> {
        let user = self.viewer()?;
        let _loading = LoadingGuard::new(&self.loading);
        let result = MessageService::new(&self.ctx)
            .upload_attachment(
                user.id,
                UploadAttachmentRequest {
                    file_name: file_name.into(),
                },
                bytes,
            )
            .await
            .map(Some);
        self.absorb(result)
    }

    // =========================================================================
    // Typing
    // =========================================================================

    pub async fn start_typing(&self) {
        if let Some(view) = self.view.lock().await.as_ref() {
            view.typing().start_typing().await;
        }
    }

    pub async fn stop_typing(&self) {
        if let Some(view) = self.view.lock().await.as_ref() {
            view.typing().stop_typing().await;
        }
    }

    /// "X is typing" line for the open conversation
    pub async fn typing_indicator(&self) -> Option<String> {
        let viewer = self.session.user_id()?;
        self.view.lock().await.as_ref()?.watcher().indicator(viewer)
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Tear down while still signed in: stop typing, close the open
    /// conversation, and write the user offline without waiting for any
    /// coalescing window
    #[instrument(skip(self))]
    pub async fn close(self) {
        if let Some(view) = self.view.lock().await.take() {
            view.typing().stop_typing().await;
        }
        if let Some(user_id) = self.session.user_id() {
            self.presence.go_offline_now(user_id).await;
            info!(user_id = %user_id, "Messaging closed");
        }
    }

    /// App moved to the foreground or background
    pub async fn set_visibility(&self, visibility: Visibility) {
        self.foreground.store(visibility.is_foreground(), Ordering::SeqCst);
        self.presence.on_visibility_change(visibility).await;

        if !visibility.is_foreground() {
            return;
        }
        let Some(user_id) = self.session.user_id() else {
            return;
        };
        if let Some(view) = self.view.lock().await.as_ref() {
            let messages = view.messages();
            send_receipts(&self.ctx, user_id, view.state(), &messages, visibility).await;
        }
    }

    fn record_sent(&self, message: &Message) {
        let mut conversations = self.conversations.lock();
        let Some(idx) = conversations
            .iter()
            .position(|s| s.conversation.id == message.conversation_id)
        else {
            return;
        };
        conversations[idx].last_message = Some(LastMessage::from(message));
        conversations[idx].conversation.touch(message.created_at);
        sort_by_recent_activity(&mut conversations);
    }
}

impl Drop for MessagingFacade {
    fn drop(&mut self) {
        for task in &self.background {
            task.abort();
        }
    }
}

struct LoadingGuard(Arc<AtomicUsize>);

impl LoadingGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn subscribe(ctx: &ServiceContext, channel: &RealtimeChannel) -> ServiceResult<Subscription> {
    Ok(ctx
        .transport()
        .subscribe(channel)
        .await
        .map_err(DomainError::from)?)
}

/// Keep counterpart online flags in the cached list current
async fn follow_presence(mut events: Subscription, conversations: SummaryCache) {
    while let Some(event) = events.recv().await {
        let DomainEvent::PresenceChanged(changed) = event else {
            continue;
        };
        for summary in conversations.lock().iter_mut() {
            if let Some(user) = summary
                .counterpart
                .as_mut()
                .filter(|u| u.id == changed.user_id)
            {
                user.set_presence(changed.is_online, changed.last_seen);
            }
        }
    }
}

/// Refresh the cached list when one of the user's conversations changes
async fn follow_inbox(ctx: ServiceContext, user_id: Snowflake, mut events: Subscription, conversations: SummaryCache) {
    while let Some(event) = events.recv().await {
        if !matches!(event, DomainEvent::ConversationUpdated(_)) {
            continue;
        }
        // Keep the old list on failure; a later update retries
        match ctx.conversation_repo().list_summaries(user_id).await {
            Ok(mut list) => {
                sort_by_recent_activity(&mut list);
                *conversations.lock() = list;
            }
            Err(e) => warn!(error = %e, "Failed to refresh conversations"),
        }
    }
}

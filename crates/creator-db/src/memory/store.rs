//! In-memory implementation of every repository trait
//!
//! Mirrors the PostgreSQL semantics (forward-only status writes, soft
//! deletes, per-user pins) so services can be exercised without a database.
//! Failures can be injected per operation.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use creator_core::entities::{
    Conversation, ConversationSummary, LastMessage, Message, Reaction, User,
};
use creator_core::error::DomainError;
use creator_core::traits::{
    ConversationRepository, MessageQuery, MessageRepository, PinRepository, ReactionRepository,
    RepoResult, UserRepository,
};
use creator_core::value_objects::{MessageStatus, Snowflake};

/// Store operations that can be observed or made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    UserRead,
    UserWrite,
    PresenceWrite,
    ConversationRead,
    ConversationWrite,
    ConversationList,
    MessageRead,
    MessageWrite,
    StatusWrite,
    PinRead,
    PinWrite,
    ReactionRead,
    ReactionWrite,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<Snowflake, User>,
    conversations: HashMap<Snowflake, Conversation>,
    messages: BTreeMap<Snowflake, Message>,
    pins: HashSet<(Snowflake, Snowflake)>,
    reactions: Vec<Reaction>,
}

/// Thread-safe in-memory repository backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    failing: Mutex<HashSet<StoreOp>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail with a database error
    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().insert(op);
    }

    /// Stop failing `op`
    pub fn heal(&self, op: StoreOp) {
        self.failing.lock().remove(&op);
    }

    pub fn heal_all(&self) {
        self.failing.lock().clear();
    }

    /// How many times `op` was attempted, failed attempts included
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    fn enter(&self, op: StoreOp) -> RepoResult<()> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        if self.failing.lock().contains(&op) {
            return Err(DomainError::DatabaseError(format!("injected failure: {op:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>> {
        self.enter(StoreOp::UserRead)?;
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Snowflake]) -> RepoResult<Vec<User>> {
        self.enter(StoreOp::UserRead)?;
        let state = self.state.read();
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn create(&self, user: &User) -> RepoResult<()> {
        self.enter(StoreOp::UserWrite)?;
        self.state.write().users.insert(user.id, user.clone());
        Ok(())
    }

    async fn set_presence(
        &self,
        id: Snowflake,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.enter(StoreOp::PresenceWrite)?;
        let mut state = self.state.write();
        let user = state.users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.set_presence(is_online, last_seen);
        Ok(())
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>> {
        self.enter(StoreOp::ConversationRead)?;
        Ok(self.state.read().conversations.get(&id).cloned())
    }

    async fn find_direct(&self, a: Snowflake, b: Snowflake) -> RepoResult<Option<Conversation>> {
        self.enter(StoreOp::ConversationRead)?;
        let state = self.state.read();
        Ok(state
            .conversations
            .values()
            .filter(|c| !c.is_group && c.has_participant(a) && c.has_participant(b))
            .min_by_key(|c| c.id)
            .cloned())
    }

    async fn create(&self, conversation: &Conversation) -> RepoResult<()> {
        self.enter(StoreOp::ConversationWrite)?;
        let mut state = self.state.write();
        if let Some(missing) = conversation
            .participants
            .iter()
            .find(|p| !state.users.contains_key(p))
        {
            return Err(DomainError::UserNotFound(*missing));
        }
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn touch(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<()> {
        self.enter(StoreOp::ConversationWrite)?;
        let mut state = self.state.write();
        let conversation = state
            .conversations
            .get_mut(&id)
            .ok_or(DomainError::ConversationNotFound(id))?;
        conversation.touch(at);
        Ok(())
    }

    async fn list_summaries(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationSummary>> {
        self.enter(StoreOp::ConversationList)?;
        let state = self.state.read();
        let summaries = state
            .conversations
            .values()
            .filter(|c| c.has_participant(user_id))
            .map(|c| ConversationSummary {
                conversation: c.clone(),
                counterpart: c
                    .counterpart_of(user_id)
                    .and_then(|other| state.users.get(&other).cloned()),
                last_message: state
                    .messages
                    .values()
                    .rev()
                    .find(|m| m.conversation_id == c.id && !m.is_deleted())
                    .map(LastMessage::from),
                pinned: state.pins.contains(&(user_id, c.id)),
            })
            .collect();
        Ok(summaries)
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        self.enter(StoreOp::MessageRead)?;
        Ok(self.state.read().messages.get(&id).cloned())
    }

    async fn find_by_conversation(
        &self,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        self.enter(StoreOp::MessageRead)?;
        let limit = query.limit.clamp(1, 100) as usize;
        let state = self.state.read();
        let live = state.messages.values().filter(|m| {
            m.conversation_id == conversation_id
                && !m.is_deleted()
                && query.before.map_or(true, |b| m.id < b)
                && query.after.map_or(true, |a| m.id > a)
        });

        let mut page: Vec<Message> = if query.after.is_some() && query.before.is_none() {
            live.take(limit).cloned().collect()
        } else {
            let mut newest: Vec<Message> = live.rev().take(limit).cloned().collect();
            newest.reverse();
            newest
        };
        page.sort_by_key(|m| m.id);
        Ok(page)
    }

    async fn create(&self, message: &Message) -> RepoResult<()> {
        self.enter(StoreOp::MessageWrite)?;
        let mut state = self.state.write();
        if !state.conversations.contains_key(&message.conversation_id) {
            return Err(DomainError::ConversationNotFound(message.conversation_id));
        }
        state.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn advance_status(
        &self,
        id: Snowflake,
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Message>> {
        self.enter(StoreOp::StatusWrite)?;
        let mut state = self.state.write();
        let Some(message) = state.messages.get_mut(&id) else {
            return Ok(None);
        };
        if message.is_deleted() || !message.apply_status(status, at) {
            return Ok(None);
        }
        Ok(Some(message.clone()))
    }

    async fn soft_delete(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<bool> {
        self.enter(StoreOp::MessageWrite)?;
        let mut state = self.state.write();
        match state.messages.get_mut(&id) {
            Some(message) if !message.is_deleted() => {
                message.deleted_at = Some(at);
                message.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl PinRepository for MemoryStore {
    async fn is_pinned(&self, user_id: Snowflake, conversation_id: Snowflake) -> RepoResult<bool> {
        self.enter(StoreOp::PinRead)?;
        Ok(self.state.read().pins.contains(&(user_id, conversation_id)))
    }

    async fn set_pinned(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
        pinned: bool,
    ) -> RepoResult<()> {
        self.enter(StoreOp::PinWrite)?;
        let mut state = self.state.write();
        if pinned {
            if !state.conversations.contains_key(&conversation_id) {
                return Err(DomainError::ConversationNotFound(conversation_id));
            }
            state.pins.insert((user_id, conversation_id));
        } else {
            state.pins.remove(&(user_id, conversation_id));
        }
        Ok(())
    }
}

#[async_trait]
impl ReactionRepository for MemoryStore {
    async fn find(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> RepoResult<Option<Reaction>> {
        self.enter(StoreOp::ReactionRead)?;
        Ok(self
            .state
            .read()
            .reactions
            .iter()
            .find(|r| r.message_id == message_id && r.user_id == user_id && r.is_emoji(emoji))
            .cloned())
    }

    async fn find_by_message(&self, message_id: Snowflake) -> RepoResult<Vec<Reaction>> {
        self.enter(StoreOp::ReactionRead)?;
        Ok(self
            .state
            .read()
            .reactions
            .iter()
            .filter(|r| r.message_id == message_id)
            .cloned()
            .collect())
    }

    async fn count_by_user(&self, message_id: Snowflake, user_id: Snowflake) -> RepoResult<i64> {
        self.enter(StoreOp::ReactionRead)?;
        let count = self
            .state
            .read()
            .reactions
            .iter()
            .filter(|r| r.message_id == message_id && r.user_id == user_id)
            .count();
        Ok(count as i64)
    }

    async fn create(&self, reaction: &Reaction) -> RepoResult<()> {
        self.enter(StoreOp::ReactionWrite)?;
        let mut state = self.state.write();
        if !state.messages.contains_key(&reaction.message_id) {
            return Err(DomainError::MessageNotFound(reaction.message_id));
        }
        let exists = state.reactions.iter().any(|r| {
            r.message_id == reaction.message_id
                && r.user_id == reaction.user_id
                && r.is_emoji(&reaction.emoji)
        });
        if !exists {
            state.reactions.push(reaction.clone());
        }
        Ok(())
    }

    async fn delete(&self, message_id: Snowflake, user_id: Snowflake, emoji: &str) -> RepoResult<()> {
        self.enter(StoreOp::ReactionWrite)?;
        self.state
            .write()
            .reactions
            .retain(|r| !(r.message_id == message_id && r.user_id == user_id && r.is_emoji(emoji)));
        Ok(())
    }
}

//! Service context - dependency container for services
//!
//! Holds the repositories, realtime transport, blob storage, and shared
//! helpers every messaging service works through.

use std::sync::Arc;
use std::time::Duration;

use creator_common::{AppConfig, AppError, MessagingConfig};
use creator_core::traits::{
    BlobStorage, ConversationRepository, MessageRepository, PinRepository, ReactionRepository,
    UserRepository,
};
use creator_core::{DomainEvent, Snowflake, SnowflakeGenerator};
use creator_db::{
    create_pool, run_migrations, LocalBlobStorage, MemoryStore, PgConversationRepository,
    PgMessageRepository, PgPinRepository, PgPool, PgReactionRepository, PgUserRepository,
    PoolConfig,
};
use creator_realtime::{MemoryTransport, RealtimeChannel, RealtimeTransport, RedisTransport};
use tracing::{debug, info, warn};

use super::error::{ServiceError, ServiceResult};
use super::notice::NoticeCenter;

/// Service context containing all dependencies
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    conversation_repo: Arc<dyn ConversationRepository>,
    message_repo: Arc<dyn MessageRepository>,
    pin_repo: Arc<dyn PinRepository>,
    reaction_repo: Arc<dyn ReactionRepository>,

    // Fan-out and storage
    transport: Arc<dyn RealtimeTransport>,
    blob_storage: Arc<dyn BlobStorage>,

    snowflake_generator: Arc<SnowflakeGenerator>,
    config: MessagingConfig,
    notices: NoticeCenter,
}

impl ServiceContext {
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Wire every backend from configuration
    ///
    /// PostgreSQL and Redis are used when configured; otherwise the
    /// in-memory store and transport take their place.
    pub async fn from_config(config: &AppConfig) -> ServiceResult<Self> {
        let mut builder = Self::builder()
            .config(config.messaging.clone())
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)))
            .blob_storage(Arc::new(LocalBlobStorage::from_config(&config.storage)));

        builder = match &config.database {
            Some(db) => {
                let pool = create_pool(&PoolConfig::from(db))
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                run_migrations(&pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                info!("Using PostgreSQL repositories");
                builder.postgres(pool)
            }
            None => {
                info!("DATABASE_URL not set, using in-memory repositories");
                builder.memory(Arc::new(MemoryStore::new()))
            }
        };

        builder = match &config.redis {
            Some(redis) => {
                let transport = RedisTransport::from_config(redis, &config.realtime)
                    .map_err(creator_core::DomainError::from)?;
                builder.transport(Arc::new(transport))
            }
            None => {
                info!("REDIS_URL not set, using in-process realtime transport");
                builder.transport(Arc::new(MemoryTransport::new(config.realtime.buffer)))
            }
        };

        builder.build()
    }

    // === Repositories ===

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    pub fn conversation_repo(&self) -> &dyn ConversationRepository {
        self.conversation_repo.as_ref()
    }

    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    pub fn pin_repo(&self) -> &dyn PinRepository {
        self.pin_repo.as_ref()
    }

    pub fn reaction_repo(&self) -> &dyn ReactionRepository {
        self.reaction_repo.as_ref()
    }

    // === Realtime ===

    /// Shared handle to the realtime transport, for tasks that outlive a borrow
    pub fn transport(&self) -> Arc<dyn RealtimeTransport> {
        Arc::clone(&self.transport)
    }

    /// Publish an event; failures are logged and otherwise ignored
    ///
    /// The write that produced the event has already succeeded, so a lost
    /// event only delays other clients until their next refresh.
    pub async fn publish(&self, channel: &RealtimeChannel, event: &DomainEvent) {
        match self.transport.publish(channel, event).await {
            Ok(receivers) => {
                debug!(channel = %channel, event = event.event_type(), receivers, "Event published");
            }
            Err(e) => {
                warn!(channel = %channel, event = event.event_type(), error = %e, "Failed to publish event");
            }
        }
    }

    // === Storage ===

    pub fn blob_storage(&self) -> &dyn BlobStorage {
        self.blob_storage.as_ref()
    }

    // === Shared ===

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    pub fn typing_idle(&self) -> Duration {
        Duration::from_millis(self.config.typing_idle_ms)
    }

    pub fn presence_coalesce(&self) -> Duration {
        Duration::from_millis(self.config.presence_coalesce_ms)
    }

    pub fn notices(&self) -> &NoticeCenter {
        &self.notices
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("transport", &"dyn RealtimeTransport")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom backends
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    conversation_repo: Option<Arc<dyn ConversationRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    pin_repo: Option<Arc<dyn PinRepository>>,
    reaction_repo: Option<Arc<dyn ReactionRepository>>,
    transport: Option<Arc<dyn RealtimeTransport>>,
    blob_storage: Option<Arc<dyn BlobStorage>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    config: Option<MessagingConfig>,
    notices: Option<NoticeCenter>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one in-memory store for every repository
    pub fn memory(self, store: Arc<MemoryStore>) -> Self {
        self.user_repo(store.clone())
            .conversation_repo(store.clone())
            .message_repo(store.clone())
            .pin_repo(store.clone())
            .reaction_repo(store)
    }

    /// Use the PostgreSQL repositories over one pool
    pub fn postgres(self, pool: PgPool) -> Self {
        self.user_repo(Arc::new(PgUserRepository::new(pool.clone())))
            .conversation_repo(Arc::new(PgConversationRepository::new(pool.clone())))
            .message_repo(Arc::new(PgMessageRepository::new(pool.clone())))
            .pin_repo(Arc::new(PgPinRepository::new(pool.clone())))
            .reaction_repo(Arc::new(PgReactionRepository::new(pool)))
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn conversation_repo(mut self, repo: Arc<dyn ConversationRepository>) -> Self {
        self.conversation_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn pin_repo(mut self, repo: Arc<dyn PinRepository>) -> Self {
        self.pin_repo = Some(repo);
        self
    }

    pub fn reaction_repo(mut self, repo: Arc<dyn ReactionRepository>) -> Self {
        self.reaction_repo = Some(repo);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn RealtimeTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn blob_storage(mut self, storage: Arc<dyn BlobStorage>) -> Self {
        self.blob_storage = Some(storage);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn config(mut self, config: MessagingConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn notices(mut self, notices: NoticeCenter) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a repository, the transport, or
    /// blob storage is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            user_repo: self.user_repo.ok_or_else(|| missing("user_repo"))?,
            conversation_repo: self.conversation_repo.ok_or_else(|| missing("conversation_repo"))?,
            message_repo: self.message_repo.ok_or_else(|| missing("message_repo"))?,
            pin_repo: self.pin_repo.ok_or_else(|| missing("pin_repo"))?,
            reaction_repo: self.reaction_repo.ok_or_else(|| missing("reaction_repo"))?,
            transport: self.transport.ok_or_else(|| missing("transport"))?,
            blob_storage: self.blob_storage.ok_or_else(|| missing("blob_storage"))?,
            snowflake_generator: self.snowflake_generator.unwrap_or_default(),
            config: self.config.unwrap_or_default(),
            notices: self.notices.unwrap_or_default(),
        })
    }
}

fn missing(what: &str) -> ServiceError {
    ServiceError::validation(format!("{what} is required"))
}

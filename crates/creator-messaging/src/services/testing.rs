//! Shared fixtures for service tests

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use creator_common::MessagingConfig;
use creator_core::traits::{ConversationRepository, MessageRepository, UserRepository};
use creator_core::{Conversation, Message, Snowflake, SnowflakeGenerator, User};
use creator_db::{MemoryBlobStorage, MemoryStore};
use creator_realtime::{MemoryTransport, RealtimeChannel, RealtimeTransport, Subscription};

use super::context::ServiceContext;

/// In-memory wiring with three users and a direct conversation between Ana and Bo
pub(crate) struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub transport: MemoryTransport,
    pub blobs: Arc<MemoryBlobStorage>,
    pub ctx: ServiceContext,
    pub ana: User,
    pub bo: User,
    pub cy: User,
    pub conversation: Conversation,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_config(MessagingConfig::default()).await
    }

    pub async fn with_config(config: MessagingConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let transport = MemoryTransport::default();
        let blobs = Arc::new(MemoryBlobStorage::default());
        let generator = Arc::new(SnowflakeGenerator::new(1));

        let ctx = ServiceContext::builder()
            .memory(Arc::clone(&store))
            .transport(Arc::new(transport.clone()))
            .blob_storage(blobs.clone())
            .snowflake_generator(Arc::clone(&generator))
            .config(config)
            .build()
            .unwrap();

        let ana = User::new(generator.generate(), "ana").with_display_name("Ana");
        let bo = User::new(generator.generate(), "bo").with_display_name("Bo");
        let cy = User::new(generator.generate(), "cy").with_display_name("Cy");
        for user in [&ana, &bo, &cy] {
            UserRepository::create(&*store, user).await.unwrap();
        }

        let conversation = Conversation::direct(generator.generate(), ana.id, bo.id);
        ConversationRepository::create(&*store, &conversation).await.unwrap();

        Self {
            store,
            transport,
            blobs,
            ctx,
            ana,
            bo,
            cy,
            conversation,
        }
    }

    pub async fn subscribe(&self, channel: &RealtimeChannel) -> Subscription {
        self.transport.subscribe(channel).await.unwrap()
    }

    /// Store a message in the Ana/Bo conversation without publishing anything
    pub async fn seed_message(&self, sender: Snowflake, text: &str) -> Message {
        self.seed_message_in(self.conversation.id, sender, text).await
    }

    pub async fn seed_message_in(&self, conversation_id: Snowflake, sender: Snowflake, text: &str) -> Message {
        let message = Message::new(self.ctx.generate_id(), conversation_id, sender, text.to_string(), None);
        MessageRepository::create(&*self.store, &message).await.unwrap();
        ConversationRepository::touch(&*self.store, conversation_id, message.created_at)
            .await
            .unwrap();
        message
    }
}

/// Poll until `check` holds, failing the test after about two seconds
pub(crate) async fn eventually<F, Fut>(check: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

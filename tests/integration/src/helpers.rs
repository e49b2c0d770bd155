//! Test helpers for integration tests
//!
//! Provides a wired platform, user registration, signed-in facades, and
//! polling helpers for asserting on asynchronous fan-out.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use creator_common::AppConfig;
use creator_core::{Conversation, DomainEvent, User};
use creator_messaging::{AuthSession, ConversationService, MessagingFacade, ServiceContext};
use creator_realtime::{RealtimeChannel, Subscription};

use crate::fixtures::unique_username;

/// Default wait for realtime fan-out
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A fully wired messaging platform
pub struct TestPlatform {
    pub ctx: ServiceContext,
    pub upload_dir: PathBuf,
}

impl TestPlatform {
    /// In-memory platform with a throwaway upload directory
    pub async fn start() -> Result<Self> {
        Self::start_with(&[]).await
    }

    /// In-memory platform with extra configuration variables
    pub async fn start_with(vars: &[(&str, &str)]) -> Result<Self> {
        let upload_dir = std::env::temp_dir().join(format!("creator-it-{}", uuid::Uuid::new_v4()));
        let mut vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        vars.insert("UPLOAD_DIR".to_string(), upload_dir.display().to_string());
        vars.insert("PUBLIC_STORAGE_URL".to_string(), "http://files.test".to_string());

        let config = AppConfig::from_lookup(|key| vars.get(key).cloned())?;
        Self::start_with_config(config, upload_dir).await
    }

    /// Platform backed by the PostgreSQL and Redis from the environment
    pub async fn start_from_env() -> Result<Self> {
        let config = test_config()?;
        let upload_dir = PathBuf::from(&config.storage.upload_dir);
        Self::start_with_config(config, upload_dir).await
    }

    pub async fn start_with_config(config: AppConfig, upload_dir: PathBuf) -> Result<Self> {
        let ctx = ServiceContext::from_config(&config).await?;
        Ok(Self { ctx, upload_dir })
    }

    /// Create a user whose display name is `name`
    pub async fn register(&self, name: &str) -> Result<User> {
        let user = User::new(self.ctx.generate_id(), unique_username(name)).with_display_name(name);
        self.ctx.user_repo().create(&user).await?;
        Ok(user)
    }

    /// Start a facade for a freshly signed-in user
    pub async fn sign_in(&self, user: &User) -> Result<MessagingFacade> {
        Ok(MessagingFacade::start(self.ctx.clone(), AuthSession::signed_in(user.clone())).await?)
    }

    pub async fn direct(&self, a: &User, b: &User) -> Result<Conversation> {
        Ok(ConversationService::new(&self.ctx)
            .find_or_create_direct(a.id, b.id)
            .await?)
    }

    pub async fn group(&self, creator: &User, name: &str, members: &[&User]) -> Result<Conversation> {
        let ids: Vec<_> = members.iter().map(|u| u.id).collect();
        Ok(ConversationService::new(&self.ctx)
            .create_group(creator.id, name, &ids)
            .await?)
    }

    pub async fn subscribe(&self, channel: &RealtimeChannel) -> Result<Subscription> {
        Ok(self.ctx.transport().subscribe(channel).await?)
    }
}

impl Drop for TestPlatform {
    fn drop(&mut self) {
        if self.upload_dir.starts_with(std::env::temp_dir()) {
            let _ = std::fs::remove_dir_all(&self.upload_dir);
        }
    }
}

/// Create a test configuration
pub fn test_config() -> Result<AppConfig> {
    // Load from environment or use defaults
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    Ok(config)
}

/// Helper to check if the backed test environment is available
pub fn check_test_env() -> bool {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    if std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: REDIS_URL not set");
        return false;
    }

    true
}

/// Poll `check` until it holds or `timeout` passes
pub async fn wait_until<F, Fut>(timeout: Duration, what: &str, check: F) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("Timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Next event on a subscription matching `pred`, skipping the rest
pub async fn next_matching<P>(sub: &mut Subscription, pred: P) -> Result<DomainEvent>
where
    P: Fn(&DomainEvent) -> bool,
{
    let wait = async {
        while let Some(event) = sub.recv().await {
            if pred(&event) {
                return Some(event);
            }
        }
        None
    };
    match tokio::time::timeout(EVENT_TIMEOUT, wait).await {
        Ok(Some(event)) => Ok(event),
        Ok(None) => anyhow::bail!("Subscription closed"),
        Err(_) => anyhow::bail!("Timed out waiting for event"),
    }
}

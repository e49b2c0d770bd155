//! Presence tracker
//!
//! Keeps the signed-in user's online flag in storage in step with the
//! session and app visibility, and announces changes on the presence
//! channel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use creator_core::events::PresenceChangedEvent;
use creator_core::{DomainEvent, Snowflake};
use creator_realtime::RealtimeChannel;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::context::ServiceContext;
use super::session::{AuthSession, Visibility};

/// Presence tracker
///
/// Cloning shares the same tracker (and its coalescing window).
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    inner: Arc<PresenceInner>,
}

#[derive(Debug)]
struct PresenceInner {
    ctx: ServiceContext,
    session: AuthSession,
    /// Latest requested state per user while a coalesced flush is pending
    pending: Mutex<HashMap<Snowflake, bool>>,
}

impl PresenceTracker {
    pub fn new(ctx: ServiceContext, session: AuthSession) -> Self {
        Self {
            inner: Arc::new(PresenceInner {
                ctx,
                session,
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Record the user's online flag
    ///
    /// Failures are logged and swallowed. With a coalescing window
    /// configured, transitions inside the window collapse to the last one.
    pub async fn set_online(&self, user_id: Snowflake, is_online: bool) {
        let window = self.inner.ctx.presence_coalesce();
        if window.is_zero() {
            self.inner.write(user_id, is_online).await;
            return;
        }

        let schedule = self.inner.pending.lock().insert(user_id, is_online).is_none();
        if !schedule {
            debug!(user_id = %user_id, is_online, "Presence write coalesced");
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let latest = inner.pending.lock().remove(&user_id);
            if let Some(is_online) = latest {
                inner.write(user_id, is_online).await;
            }
        });
    }

    /// Write the user offline right away, dropping any coalesced state
    ///
    /// Used at teardown, where a pending flush would never run.
    pub async fn go_offline_now(&self, user_id: Snowflake) {
        self.inner.pending.lock().remove(&user_id);
        self.inner.write(user_id, false).await;
    }

    /// Foreground/background transition of the app
    pub async fn on_visibility_change(&self, visibility: Visibility) {
        let Some(user_id) = self.inner.session.user_id() else {
            debug!(?visibility, "No session, presence update skipped");
            return;
        };
        self.set_online(user_id, visibility.is_foreground()).await;
    }

    pub async fn on_session_started(&self, user_id: Snowflake) {
        self.set_online(user_id, true).await;
    }

    pub async fn on_session_ended(&self, user_id: Snowflake) {
        self.set_online(user_id, false).await;
    }

    /// Follow the auth session until the returned guard is dropped
    pub fn watch_session(&self) -> SessionWatch {
        let tracker = self.clone();
        let mut rx = self.inner.session.subscribe();

        let handle = tokio::spawn(async move {
            let mut current = rx.borrow_and_update().as_ref().map(|u| u.id);
            if let Some(user_id) = current {
                tracker.on_session_started(user_id).await;
            }

            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().as_ref().map(|u| u.id);
                if next == current {
                    continue;
                }
                if let Some(previous) = current {
                    tracker.on_session_ended(previous).await;
                }
                if let Some(user_id) = next {
                    tracker.on_session_started(user_id).await;
                }
                current = next;
            }
        });

        SessionWatch { handle }
    }
}

impl PresenceInner {
    #[instrument(skip(self))]
    async fn write(&self, user_id: Snowflake, is_online: bool) {
        let last_seen = Utc::now();
        if let Err(e) = self
            .ctx
            .user_repo()
            .set_presence(user_id, is_online, last_seen)
            .await
        {
            warn!(user_id = %user_id, is_online, error = %e, "Failed to store presence");
            return;
        }

        info!(user_id = %user_id, is_online, "Presence updated");

        let event = DomainEvent::PresenceChanged(PresenceChangedEvent {
            user_id,
            is_online,
            last_seen,
            timestamp: last_seen,
        });
        self.ctx.publish(&RealtimeChannel::presence(), &event).await;
    }
}

/// Session-following task; stops when dropped
#[derive(Debug)]
pub struct SessionWatch {
    handle: JoinHandle<()>,
}

impl Drop for SessionWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

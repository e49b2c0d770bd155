//! Signed-in user session and app visibility

use std::sync::Arc;

use creator_core::{Snowflake, User};
use tokio::sync::watch;
use tracing::info;

/// Current signed-in user, fed by the external auth provider
///
/// Cloning shares the same session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    tx: Arc<watch::Sender<Option<User>>>,
}

impl AuthSession {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn signed_in(user: User) -> Self {
        let session = Self::new();
        session.sign_in(user);
        session
    }

    pub fn current_user(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    pub fn user_id(&self) -> Option<Snowflake> {
        self.tx.borrow().as_ref().map(|u| u.id)
    }

    /// Follow session changes; the receiver sees the current value first
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }

    pub fn sign_in(&self, user: User) {
        info!(user_id = %user.id, "Session started");
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if let Some(user) = self.tx.send_replace(None) {
            info!(user_id = %user.id, "Session ended");
        }
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the app is in the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Foreground,
    Background,
}

impl Visibility {
    #[inline]
    pub fn is_foreground(self) -> bool {
        matches!(self, Self::Foreground)
    }

    pub fn from_foreground(foreground: bool) -> Self {
        if foreground {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

//! Typing signal broadcaster and watcher
//!
//! The broadcaster runs the local `Idle -> Typing -> Idle` machine for one
//! user in one conversation. The watcher folds remote signals into a
//! [`TypingState`].

use std::sync::{Arc, Weak};
use std::time::Duration;

use creator_core::{DomainEvent, Snowflake, TypingSignal, TypingState, User};
use creator_realtime::{RealtimeChannel, RealtimeTransport};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::ServiceResult;

/// Broadcasts the local user's typing state for one conversation
///
/// Dropping the broadcaster cancels the idle timer.
pub struct TypingBroadcaster {
    inner: Arc<TypingInner>,
}

struct TypingInner {
    transport: Arc<dyn RealtimeTransport>,
    channel: RealtimeChannel,
    signal: TypingSignal,
    idle: Duration,
    phase: Mutex<Phase>,
}

#[derive(Default)]
struct Phase {
    /// Armed idle timer; `Some` exactly while typing
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl TypingBroadcaster {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        conversation_id: Snowflake,
        user: &User,
        idle: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(TypingInner {
                transport,
                channel: RealtimeChannel::typing(conversation_id),
                signal: TypingSignal {
                    conversation_id,
                    user_id: user.id,
                    username: user.name().to_string(),
                    avatar: user.avatar.clone(),
                    is_typing: false,
                },
                idle,
                phase: Mutex::new(Phase::default()),
            }),
        }
    }

    pub fn conversation_id(&self) -> Snowflake {
        self.inner.signal.conversation_id
    }

    pub fn is_typing(&self) -> bool {
        self.inner.phase.lock().timer.is_some()
    }

    /// A keystroke: announce typing when idle, otherwise push the timer back
    pub async fn start_typing(&self) {
        let was_idle = {
            let mut phase = self.inner.phase.lock();
            let was_idle = match phase.timer.take() {
                Some(timer) => {
                    timer.abort();
                    false
                }
                None => true,
            };
            phase.generation += 1;
            phase.timer = Some(spawn_idle_timer(
                Arc::downgrade(&self.inner),
                phase.generation,
                self.inner.idle,
            ));
            was_idle
        };

        if was_idle {
            self.inner.publish(true).await;
        }
    }

    /// Go idle now; no-op when already idle
    pub async fn stop_typing(&self) {
        let timer = self.inner.phase.lock().timer.take();
        if let Some(timer) = timer {
            timer.abort();
            self.inner.publish(false).await;
        }
    }
}

impl Drop for TypingBroadcaster {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.phase.lock().timer.take() {
            timer.abort();
        }
    }
}

fn spawn_idle_timer(inner: Weak<TypingInner>, generation: u64, idle: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(idle).await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let expired = {
            let mut phase = inner.phase.lock();
            if phase.generation == generation && phase.timer.is_some() {
                // Detach rather than abort: this is the running task
                drop(phase.timer.take());
                true
            } else {
                false
            }
        };
        if expired {
            debug!(conversation_id = %inner.signal.conversation_id, "Typing went idle");
            inner.publish(false).await;
            inner.reannounce_if_rearmed(generation).await;
        }
    })
}

impl TypingInner {
    /// A keystroke may re-arm between expiry and the `false` landing on a
    /// multi-thread runtime; its `true` can then arrive first, so repeat it
    async fn reannounce_if_rearmed(&self, expired_generation: u64) {
        let rearmed = {
            let phase = self.phase.lock();
            phase.generation != expired_generation && phase.timer.is_some()
        };
        if rearmed {
            self.publish(true).await;
        }
    }

    async fn publish(&self, is_typing: bool) {
        let signal = TypingSignal {
            is_typing,
            ..self.signal.clone()
        };
        if let Err(e) = self
            .transport
            .publish(&self.channel, &DomainEvent::typing(signal))
            .await
        {
            warn!(channel = %self.channel, is_typing, error = %e, "Failed to publish typing signal");
        }
    }
}

/// Live "who is typing" state of one conversation
///
/// Owns the channel subscription; dropping the watcher releases it.
pub struct TypingWatcher {
    conversation_id: Snowflake,
    state: watch::Receiver<TypingState>,
    task: JoinHandle<()>,
}

impl TypingWatcher {
    pub async fn subscribe(
        transport: &dyn RealtimeTransport,
        conversation_id: Snowflake,
    ) -> ServiceResult<Self> {
        let mut subscription = transport
            .subscribe(&RealtimeChannel::typing(conversation_id))
            .await
            .map_err(creator_core::DomainError::from)?;
        let (tx, state) = watch::channel(TypingState::new());

        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let DomainEvent::TypingChanged(changed) = event else {
                    continue;
                };
                if changed.signal.conversation_id != conversation_id {
                    continue;
                }
                tx.send_modify(|state| *state = std::mem::take(state).apply(changed.signal));
            }
        });

        Ok(Self {
            conversation_id,
            state,
            task,
        })
    }

    pub fn conversation_id(&self) -> Snowflake {
        self.conversation_id
    }

    pub fn state(&self) -> TypingState {
        self.state.borrow().clone()
    }

    /// Indicator text for `viewer`, who is never listed
    pub fn indicator(&self, viewer: Snowflake) -> Option<String> {
        self.state.borrow().indicator(viewer)
    }

    /// A receiver that wakes on every change
    pub fn receiver(&self) -> watch::Receiver<TypingState> {
        self.state.clone()
    }
}

impl Drop for TypingWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

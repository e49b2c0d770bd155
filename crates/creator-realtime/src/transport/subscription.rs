//! Scoped subscription handle.

use creator_core::DomainEvent;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::pubsub::RealtimeChannel;

type Release = Box<dyn FnOnce() + Send + Sync>;

/// Live subscription to one realtime channel
///
/// Events arrive in transport order. Dropping the handle detaches the
/// receiver and lets the transport tear the channel down once the last
/// subscriber is gone.
pub struct Subscription {
    channel: RealtimeChannel,
    rx: Option<broadcast::Receiver<DomainEvent>>,
    release: Option<Release>,
}

impl Subscription {
    pub(crate) fn new(
        channel: RealtimeChannel,
        rx: broadcast::Receiver<DomainEvent>,
        release: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            channel,
            rx: Some(rx),
            release: Some(Box::new(release)),
        }
    }

    #[must_use]
    pub fn channel(&self) -> &RealtimeChannel {
        &self.channel
    }

    /// Wait for the next event; `None` once the channel is closed
    ///
    /// A slow consumer that falls behind skips the overwritten events.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.channel, skipped, "Subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take an already-delivered event without waiting
    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Receiver first, so the release sees an accurate receiver count
        drop(self.rx.take());
        if let Some(release) = self.release.take() {
            release();
        }
        tracing::trace!(channel = %self.channel, "Subscription released");
    }
}

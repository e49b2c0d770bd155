//! Local fan-out table: channel name -> broadcast sender.

use creator_core::DomainEvent;
use dashmap::DashMap;
use tokio::sync::broadcast;

/// Per-process routing table shared by the transports
#[derive(Debug)]
pub(crate) struct ChannelRegistry {
    routes: DashMap<String, broadcast::Sender<DomainEvent>>,
    buffer: usize,
}

impl ChannelRegistry {
    pub(crate) fn new(buffer: usize) -> Self {
        Self {
            routes: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Attach a receiver; the flag is true when the route was just created
    pub(crate) fn attach(&self, name: &str) -> (broadcast::Receiver<DomainEvent>, bool) {
        let mut created = false;
        let rx = self
            .routes
            .entry(name.to_string())
            .or_insert_with(|| {
                created = true;
                broadcast::channel(self.buffer).0
            })
            .subscribe();
        (rx, created)
    }

    /// Deliver to local receivers, returning how many got the event
    pub(crate) fn deliver(&self, name: &str, event: DomainEvent) -> usize {
        let Some(tx) = self.routes.get(name).map(|r| r.value().clone()) else {
            return 0;
        };
        tx.send(event).unwrap_or(0)
    }

    /// Drop the route when nobody listens anymore; true when it was removed
    pub(crate) fn release(&self, name: &str) -> bool {
        self.routes
            .remove_if(name, |_, tx| tx.receiver_count() == 0)
            .is_some()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.key().clone()).collect()
    }

    pub(crate) fn receiver_count(&self, name: &str) -> usize {
        self.routes.get(name).map_or(0, |r| r.receiver_count())
    }
}

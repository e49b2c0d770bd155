//! Redis Pub/Sub subscriber.
//!
//! Holds one Redis pub/sub connection and routes incoming events into the
//! local fan-out table. Reconnects and re-subscribes after errors.

use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::error::{RealtimeError, RealtimeResult};
use crate::pubsub::publisher::decode;
use crate::transport::ChannelRegistry;

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            reconnect_delay_ms: 1000,
        }
    }
}

/// Commands for subscription management
#[derive(Debug)]
enum SubscriberCommand {
    /// Answered once Redis has confirmed the subscription
    Subscribe(String, oneshot::Sender<RealtimeResult<()>>),
    Unsubscribe(String),
    Shutdown,
}

/// Background Redis listener
#[derive(Debug)]
pub(crate) struct Subscriber {
    /// Currently subscribed channels, replayed on reconnect
    subscribed: Arc<RwLock<HashSet<String>>>,
    /// Control channel for subscription management
    control_tx: mpsc::Sender<SubscriberCommand>,
}

impl Subscriber {
    /// Create a new subscriber and start the background listener
    pub(crate) fn spawn(config: SubscriberConfig, registry: Arc<ChannelRegistry>) -> Self {
        let (control_tx, control_rx) = mpsc::channel(64);
        let subscribed = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(Self::listener_loop(
            config,
            subscribed.clone(),
            registry,
            control_rx,
        ));

        Self {
            subscribed,
            control_tx,
        }
    }

    /// Background listener loop
    async fn listener_loop(
        config: SubscriberConfig,
        subscribed: Arc<RwLock<HashSet<String>>>,
        registry: Arc<ChannelRegistry>,
        mut control_rx: mpsc::Receiver<SubscriberCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &subscribed, &registry, &mut control_rx).await {
                Ok(true) => {
                    tracing::info!("Subscriber shutting down");
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting...");
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// Run the listener until error or shutdown; `Ok(true)` means stop
    async fn run_listener(
        config: &SubscriberConfig,
        subscribed: &Arc<RwLock<HashSet<String>>>,
        registry: &ChannelRegistry,
        control_rx: &mut mpsc::Receiver<SubscriberCommand>,
    ) -> RealtimeResult<bool> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        {
            let channels = subscribed.read().await;
            for channel in channels.iter() {
                pubsub.subscribe(channel).await?;
            }
        }

        tracing::info!("Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        tracing::warn!("Pub/Sub stream ended");
                        return Ok(false);
                    };
                    let channel_name = msg.get_channel_name().to_string();
                    let payload: String = msg.get_payload().unwrap_or_default();

                    match decode(&payload) {
                        Ok(event) => {
                            let receivers = registry.deliver(&channel_name, event);
                            tracing::trace!(channel = %channel_name, receivers, "Routed Pub/Sub message");
                        }
                        Err(e) => {
                            tracing::warn!(channel = %channel_name, error = %e, "Dropping undecodable event");
                        }
                    }
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(SubscriberCommand::Subscribe(channel, ack)) => {
                            // Need to drop stream to access pubsub
                            drop(stream);
                            if let Err(e) = pubsub.subscribe(&channel).await {
                                let _ = ack.send(Err(RealtimeError::SubscribeFailed(e.to_string())));
                                return Err(e.into());
                            }
                            subscribed.write().await.insert(channel.clone());
                            tracing::debug!(channel = %channel, "Subscribed to channel");
                            let _ = ack.send(Ok(()));
                            stream = pubsub.on_message();
                        }
                        Some(SubscriberCommand::Unsubscribe(channel)) => {
                            drop(stream);
                            if let Err(e) = pubsub.unsubscribe(&channel).await {
                                tracing::error!(channel = %channel, error = %e, "Failed to unsubscribe");
                            }
                            subscribed.write().await.remove(&channel);
                            tracing::debug!(channel = %channel, "Unsubscribed from channel");
                            stream = pubsub.on_message();
                        }
                        Some(SubscriberCommand::Shutdown) | None => {
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }

    /// Subscribe to a channel, returning once Redis has confirmed it
    pub(crate) async fn subscribe(&self, channel: String) -> RealtimeResult<()> {
        let (ack, confirmed) = oneshot::channel();
        self.control_tx
            .send(SubscriberCommand::Subscribe(channel, ack))
            .await
            .map_err(|_| RealtimeError::ChannelClosed)?;
        confirmed.await.map_err(|_| RealtimeError::ChannelClosed)?
    }

    pub(crate) fn control(&self) -> SubscriberHandle {
        SubscriberHandle {
            control_tx: self.control_tx.clone(),
        }
    }

    /// Get currently subscribed channels
    pub(crate) async fn subscribed_channels(&self) -> Vec<String> {
        self.subscribed.read().await.iter().cloned().collect()
    }

    /// Shutdown the subscriber
    pub(crate) async fn shutdown(&self) -> RealtimeResult<()> {
        self.control_tx
            .send(SubscriberCommand::Shutdown)
            .await
            .map_err(|_| RealtimeError::ChannelClosed)
    }
}

/// Cheap handle to queue unsubscribes from subscription release hooks
#[derive(Debug, Clone)]
pub(crate) struct SubscriberHandle {
    control_tx: mpsc::Sender<SubscriberCommand>,
}

impl SubscriberHandle {
    pub(crate) fn unsubscribe_later(&self, channel: String) {
        if let Err(e) = self.control_tx.try_send(SubscriberCommand::Unsubscribe(channel)) {
            tracing::warn!(error = %e, "Could not queue unsubscribe");
        }
    }
}

//! In-process pub/sub hub for live weather notifications.
//!
//! One broadcast channel reaches every connected subscriber; directed
//! channels are keyed by subscriber id and created lazily. Publishing never
//! blocks and delivering to zero subscribers is a successful no-op, so the
//! hub satisfies the best-effort contract of `NotificationPublisher`.

use async_trait::async_trait;
use nimbus_domain::{BroadcastError, NotificationPublisher, WeatherEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

#[derive(Clone)]
pub struct NotificationHub {
    all: broadcast::Sender<WeatherEvent>,
    directed: Arc<RwLock<HashMap<String, broadcast::Sender<WeatherEvent>>>>,
    capacity: usize,
}

impl NotificationHub {
    /// Create a hub with the default per-channel capacity (256 events).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (all, _) = broadcast::channel(capacity);
        Self {
            all,
            directed: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Subscribe to the broadcast destination.
    pub fn subscribe(&self) -> broadcast::Receiver<WeatherEvent> {
        self.all.subscribe()
    }

    /// Subscribe to one subscriber's directed destination, creating the
    /// channel if it does not exist.
    pub async fn subscribe_directed(&self, subscriber_id: &str) -> broadcast::Receiver<WeatherEvent> {
        let mut directed = self.directed.write().await;
        let tx = directed
            .entry(subscriber_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Remove directed channels with zero subscribers (housekeeping).
    pub async fn cleanup(&self) {
        let mut directed = self.directed.write().await;
        directed.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationPublisher for NotificationHub {
    async fn broadcast(&self, event: &WeatherEvent) -> Result<(), BroadcastError> {
        // Send errors only mean there are no active receivers
        let _ = self.all.send(event.clone());
        Ok(())
    }

    async fn send_to_subscriber(
        &self,
        subscriber_id: &str,
        event: &WeatherEvent,
    ) -> Result<(), BroadcastError> {
        let directed = self.directed.read().await;
        if let Some(tx) = directed.get(subscriber_id) {
            let _ = tx.send(event.clone());
        }
        Ok(())
    }
}

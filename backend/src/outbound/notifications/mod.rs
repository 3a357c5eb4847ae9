//! In-process notification hub backed by a tokio broadcast channel.
//!
//! The hub implements both halves of the side-channel: services publish
//! through `NotificationPublisher` and the WebSocket endpoint subscribes
//! through `NotificationFeed`, filtering by channel name.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::ports::{
    Notification, NotificationError, NotificationFeed, NotificationPublisher,
};

/// Events buffered per subscriber before slow receivers start lagging.
pub const DEFAULT_HUB_CAPACITY: usize = 256;

/// Fan-out of notifications to every live subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastNotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotificationHub {
    /// Create a hub buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl Default for BroadcastNotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

#[async_trait]
impl NotificationPublisher for BroadcastNotificationHub {
    async fn emit(&self, notification: Notification) -> Result<(), NotificationError> {
        let channel = notification.channel.clone();
        match self.sender.send(notification) {
            Ok(receivers) => trace!(%channel, receivers, "notification published"),
            Err(_) => trace!(%channel, "notification dropped: no subscribers"),
        }
        Ok(())
    }
}

impl NotificationFeed for BroadcastNotificationHub {
    fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

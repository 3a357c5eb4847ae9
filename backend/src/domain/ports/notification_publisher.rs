//! Best-effort real-time notifications.
//!
//! Publishing never blocks or fails the operation that triggered it;
//! callers log emission errors and move on.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use super::define_port_error;

/// A named event on a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub channel: String,
    pub event: String,
    #[serde(rename = "data")]
    pub payload: Value,
}

impl Notification {
    pub fn new(channel: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
            payload,
        }
    }
}

define_port_error! {
    /// Errors raised while emitting notifications.
    pub enum NotificationError {
        /// The transport refused or dropped the event.
        Delivery { message: String } => "notification delivery failed: {message}",
    }
}

/// Port for emitting notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Emit an event. Having no listeners is not an error.
    async fn emit(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Source of notifications for push transports such as WebSockets.
pub trait NotificationFeed: Send + Sync {
    /// Receive every notification emitted after this call.
    fn subscribe(&self) -> broadcast::Receiver<Notification>;
}

/// Publisher that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationPublisher;

#[async_trait]
impl NotificationPublisher for FixtureNotificationPublisher {
    async fn emit(&self, _notification: Notification) -> Result<(), NotificationError> {
        Ok(())
    }
}

//! Per-connection payment channel.
//!
//! A connection follows exactly one `payment-{id}` channel and forwards each
//! matching notification as a JSON text frame. The public contract pings
//! every 5s and drops a client after 10s without traffic. Tests shorten both
//! intervals.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;
use tracing::{debug, warn};

use crate::domain::ports::Notification;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_payment_session(
    channel: String,
    notifications: broadcast::Receiver<Notification>,
    session: Session,
    stream: MessageStream,
) {
    PaymentSession::new(channel, notifications)
        .run(session, stream)
        .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    FeedClosed,
    Network(Closed),
}

struct PaymentSession {
    channel: String,
    notifications: broadcast::Receiver<Notification>,
}

impl PaymentSession {
    fn new(channel: String, notifications: broadcast::Receiver<Notification>) -> Self {
        Self {
            channel,
            notifications,
        }
    }

    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    handle_heartbeat_tick(&mut session, last_heartbeat).await
                }
                message = stream.recv() => {
                    handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                notification = self.notifications.recv() => {
                    self.handle_notification(&mut session, notification).await
                }
            };

            if let Err(error) = result {
                log_shutdown_reason(&self.channel, &error);
                if let Some(reason) = close_reason_for(error) {
                    if let Err(close_error) = session.close(reason).await {
                        warn!(error = %close_error, "Failed to close WebSocket session");
                    }
                }
                return;
            }
        }
    }

    async fn handle_notification(
        &self,
        session: &mut Session,
        notification: Result<Notification, RecvError>,
    ) -> Result<(), SessionError> {
        match notification {
            Ok(notification) if notification.channel == self.channel => {
                send_json(session, &notification)
                    .await
                    .map_err(SessionError::Network)
            }
            Ok(_) => Ok(()),
            Err(RecvError::Lagged(skipped)) => {
                warn!(channel = %self.channel, skipped, "WebSocket subscriber lagged");
                Ok(())
            }
            Err(RecvError::Closed) => Err(SessionError::FeedClosed),
        }
    }
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: Instant,
) -> Result<(), SessionError> {
    if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionError::HeartbeatTimeout);
    }
    session.ping(b"").await.map_err(SessionError::Network)
}

async fn handle_stream_message(
    session: &mut Session,
    last_heartbeat: &mut Instant,
    message: Option<Result<Message, ProtocolError>>,
) -> Result<(), SessionError> {
    let Some(message) = message else {
        return Err(SessionError::StreamClosed);
    };

    match message.map_err(SessionError::Protocol)? {
        Message::Ping(payload) => {
            *last_heartbeat = Instant::now();
            session.pong(&payload).await.map_err(SessionError::Network)
        }
        // The channel is server-push only; client frames just count as liveness.
        Message::Text(_)
        | Message::Pong(_)
        | Message::Binary(_)
        | Message::Continuation(_)
        | Message::Nop => {
            *last_heartbeat = Instant::now();
            Ok(())
        }
        Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
    }
}

async fn send_json(session: &mut Session, notification: &Notification) -> Result<(), Closed> {
    match serde_json::to_string(notification) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "Failed to serialize WebSocket payload");
            Ok(())
        }
    }
}

fn log_shutdown_reason(channel: &str, error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => {
            debug!(%channel, "WebSocket heartbeat timeout; closing connection");
        }
        SessionError::Protocol(error) => {
            warn!(%channel, error = %error, "WebSocket protocol error");
        }
        SessionError::Network(error) => {
            warn!(%channel, error = %error, "WebSocket send failed; closing connection");
        }
        SessionError::FeedClosed => {
            warn!(%channel, "Notification feed closed; closing connection");
        }
        SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
    }
}

fn close_reason_for(error: SessionError) -> Option<Option<CloseReason>> {
    match error {
        SessionError::HeartbeatTimeout => Some(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        })),
        SessionError::Protocol(_) => Some(Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        })),
        SessionError::FeedClosed => Some(Some(CloseReason {
            code: CloseCode::Away,
            description: Some("server shutting down".to_owned()),
        })),
        SessionError::ClientClosed(reason) => Some(reason),
        SessionError::StreamClosed | SessionError::Network(_) => None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

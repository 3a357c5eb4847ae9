//! WebSocket-focused test helpers.
//!
//! Integration tests under `backend/tests/` compile as separate crates, so
//! the payment-channel state is assembled here once.

use std::sync::Arc;

use docket::inbound::ws::state::{OriginAllowList, WsState};
use docket::outbound::notifications::BroadcastNotificationHub;

/// Origins accepted by [`ws_state`].
pub const ALLOWED_ORIGINS: [&str; 2] = ["https://app.docket.example", "http://localhost:3000"];

/// Build a `WsState` backed by a fresh notification hub.
pub fn ws_state() -> (WsState, Arc<BroadcastNotificationHub>) {
    let hub = Arc::new(BroadcastNotificationHub::default());
    let origins = OriginAllowList::parse(ALLOWED_ORIGINS).expect("valid origins");
    (WsState::new(hub.clone(), origins), hub)
}

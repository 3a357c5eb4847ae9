//! WebSocket inbound adapter pushing settlement notifications to clients.
//!
//! Responsibilities:
//! - validate upgrade requests against the configured origin allow-list
//! - subscribe the connection to its `payment-{id}` channel
//! - keep WebSocket framing and heartbeats at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, info, warn};
use url::Url;

use crate::domain::payment_channel;

mod session;

pub mod state;

use state::OriginAllowList;

/// Open the notification channel for one payment link.
///
/// Upgrade requests must carry exactly one `Origin` header from the
/// allow-list. Events are delivered as
/// `{"channel":"payment-{id}","event":"payment-completed","data":{...}}`.
#[get("/ws/payments/{payment_link_id}")]
pub async fn payment_channel_ws(
    state: web::Data<state::WsState>,
    path: web::Path<String>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state.allowed_origins, origin_header)?;

    let link_id = path.into_inner();
    if link_id.trim().is_empty() {
        return Err(actix_web::error::ErrorBadRequest("payment_link_id required"));
    }
    let channel = payment_channel(&link_id);
    // Subscribe before answering the upgrade so no event emitted after the
    // handshake can be missed.
    let notifications = state.feed.subscribe();

    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;
    info!(%channel, "payment channel opened");
    actix_web::rt::spawn(session::handle_payment_session(
        channel,
        notifications,
        session,
        messages,
    ));
    Ok(response)
}

fn validate_origin(allowed: &OriginAllowList, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = origin_header.to_str().map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as string");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

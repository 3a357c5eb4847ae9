//! Behavioural tests for payment-channel origin validation.

#[path = "support/ws.rs"]
mod ws_support;

use actix_http::Request;
use actix_web::http::header::HeaderValue;
use actix_web::{
    App,
    body::BoxBody,
    dev::{Service, ServiceResponse},
    http::{StatusCode, header},
    test::{self, TestRequest},
    web,
};
use docket::inbound::ws;
use docket::inbound::ws::state::WsState;
use rstest::{fixture, rstest};

// Example Sec-WebSocket-Key from RFC 6455 section 1.3 used to satisfy handshake requirements.
const RFC6455_SAMPLE_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

#[fixture]
fn ws_state() -> WsState {
    ws_support::ws_state().0
}

async fn init_app(
    state: WsState,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(ws::payment_channel_ws),
    )
    .await
}

fn handshake_request(link_id: &str) -> TestRequest {
    TestRequest::get()
        .uri(&format!("/ws/payments/{link_id}"))
        .insert_header((header::UPGRADE, "websocket"))
        .insert_header((header::CONNECTION, "Upgrade"))
        .insert_header((header::SEC_WEBSOCKET_VERSION, "13"))
        .insert_header((header::SEC_WEBSOCKET_KEY, RFC6455_SAMPLE_KEY))
}

#[derive(Debug, Clone, Copy)]
/// Origin header shapes that must not upgrade.
enum OriginHeaderCase {
    /// No Origin header present.
    Missing,
    /// Origin not in the allow-list.
    Unlisted,
    /// Same host on a different port.
    WrongPort,
    /// Multiple Origin headers (forbidden by RFC 6455).
    Multiple,
    /// Malformed Origin header (invalid UTF-8).
    Malformed,
}

fn handshake_request_for_origin_case(origin_case: OriginHeaderCase) -> Request {
    let request = handshake_request("plink_1");
    match origin_case {
        OriginHeaderCase::Missing => request.to_request(),
        OriginHeaderCase::Unlisted => request
            .append_header((header::ORIGIN, "https://example.com"))
            .to_request(),
        OriginHeaderCase::WrongPort => request
            .append_header((header::ORIGIN, "http://localhost:4000"))
            .to_request(),
        OriginHeaderCase::Multiple => request
            .append_header((header::ORIGIN, ws_support::ALLOWED_ORIGINS[0]))
            .append_header((header::ORIGIN, "https://example.com"))
            .to_request(),
        OriginHeaderCase::Malformed => {
            // Byte 0x80 is invalid UTF-8.
            let invalid = HeaderValue::from_bytes(&[0x80]).expect("opaque Origin header value");
            request.insert_header((header::ORIGIN, invalid)).to_request()
        }
    }
}

#[rstest]
#[case(ws_support::ALLOWED_ORIGINS[0])]
#[case(ws_support::ALLOWED_ORIGINS[1])]
fn upgrades_when_origin_allowed(ws_state: WsState, #[case] origin: &str) {
    actix_rt::System::new().block_on(async move {
        let app = init_app(ws_state).await;

        let req = handshake_request("plink_1")
            .insert_header((header::ORIGIN, origin))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(
            response.status(),
            StatusCode::SWITCHING_PROTOCOLS,
            "origin {origin}"
        );
    });
}

#[rstest]
#[case(OriginHeaderCase::Missing, StatusCode::FORBIDDEN)]
#[case(OriginHeaderCase::Unlisted, StatusCode::FORBIDDEN)]
#[case(OriginHeaderCase::WrongPort, StatusCode::FORBIDDEN)]
#[case(OriginHeaderCase::Multiple, StatusCode::BAD_REQUEST)]
#[case(OriginHeaderCase::Malformed, StatusCode::BAD_REQUEST)]
fn rejects_disallowed_origin_headers(
    ws_state: WsState,
    #[case] origin_case: OriginHeaderCase,
    #[case] expected: StatusCode,
) {
    actix_rt::System::new().block_on(async move {
        let app = init_app(ws_state).await;

        let req = handshake_request_for_origin_case(origin_case);
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), expected, "{origin_case:?}");
    });
}

#[rstest]
fn rejects_blank_payment_link(ws_state: WsState) {
    actix_rt::System::new().block_on(async move {
        let app = init_app(ws_state).await;

        let req = handshake_request("%20")
            .insert_header((header::ORIGIN, ws_support::ALLOWED_ORIGINS[1]))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    });
}

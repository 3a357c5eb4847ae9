//! Payment-provider webhook endpoint.
//!
//! ```text
//! POST /api/v1/webhooks/stripe
//! Stripe-Signature: t=1760000000,v1=5257a869...
//! {"type":"checkout.session.completed","data":{"object":{"payment_status":"paid",...}}}
//! ```
//!
//! The provider retries deliveries that do not receive a 2xx, so outcomes
//! that will never change (duplicates, unpaid sessions, unrelated events)
//! are acknowledged with `200` and a status string.

use std::collections::BTreeMap;

use actix_web::{HttpRequest, post, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{Error, ErrorCode, PaymentConfirmation};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Header carrying the provider's HMAC signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
/// The only event type that drives settlement.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Envelope of a provider event; unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<WebhookEventData>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: CheckoutSession,
}

/// The fields of a checkout session that settlement needs.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub payment_link: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl From<CheckoutSession> for PaymentConfirmation {
    fn from(session: CheckoutSession) -> Self {
        Self {
            paid: session.payment_status.as_deref() == Some("paid"),
            payment_link: session.payment_link,
            metadata: session.metadata,
        }
    }
}

/// Acknowledgement body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct WebhookAck {
    /// `settled`, `already_processed` or `ignored`.
    pub status: String,
}

impl WebhookAck {
    fn new(status: &str) -> web::Json<Self> {
        web::Json(Self {
            status: status.to_owned(),
        })
    }
}

/// Receive a signed payment-provider event.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/stripe",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event handled or acknowledged", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature, or malformed event", body = ErrorSchema),
        (status = 404, description = "Payment reference unknown; provider should retry", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["webhooks"],
    operation_id = "stripeWebhook",
    security([])
)]
#[post("/webhooks/stripe")]
pub async fn stripe_webhook(
    state: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<WebhookAck>> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::invalid_request("missing webhook signature"))?;
    state.webhooks.verify(signature, &body).map_err(|error| {
        warn!(%error, "rejected webhook delivery");
        Error::invalid_request(format!("invalid webhook signature: {error}"))
    })?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|error| Error::invalid_request(format!("malformed webhook event: {error}")))?;
    if event.event_type != CHECKOUT_COMPLETED {
        debug!(event_type = %event.event_type, "ignoring webhook event");
        return Ok(WebhookAck::new("ignored"));
    }
    let session = event.data.map(|data| data.object).unwrap_or_default();

    match state.settlement.confirm_settlement(session.into()).await {
        Ok(receipt) => {
            info!(
                payment_id = %receipt.payment_id,
                quote_id = %receipt.quote_id,
                case_id = %receipt.case_id,
                "settlement confirmed"
            );
            Ok(WebhookAck::new("settled"))
        }
        Err(error) => match error.code() {
            ErrorCode::Conflict => {
                info!(reason = %error.message(), "duplicate settlement delivery");
                Ok(WebhookAck::new("already_processed"))
            }
            ErrorCode::InvalidState => {
                debug!(reason = %error.message(), "settlement not applicable");
                Ok(WebhookAck::new("ignored"))
            }
            _ => Err(error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_http::Request;
    use actix_web::body::BoxBody;
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::domain::ports::{SettlementReceipt, WebhookAuthError};
    use crate::domain::{CaseId, PaymentId, QuoteId};
    use crate::inbound::http::test_utils::{MockPorts, QUOTE_ID, metadata};

    async fn app(
        ports: MockPorts,
    ) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
        test::init_service(
            App::new()
                .app_data(ports.into_state())
                .service(web::scope("/api/v1").service(stripe_webhook)),
        )
        .await
    }

    fn accepting(mut ports: MockPorts) -> MockPorts {
        ports.webhooks.expect_verify().returning(|_, _| Ok(()));
        ports
    }

    fn completed_event(payment_status: &str) -> Value {
        json!({
            "id": "evt_1",
            "type": CHECKOUT_COMPLETED,
            "data": { "object": {
                "payment_status": payment_status,
                "payment_link": "plink_1",
                "metadata": { "quote_id": QUOTE_ID, "case_id": "c", "payment_link_id": "" }
            }}
        })
    }

    async fn deliver(ports: MockPorts, body: &Value) -> ServiceResponse<BoxBody> {
        let app = app(ports).await;
        test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/webhooks/stripe")
                .insert_header((SIGNATURE_HEADER, "t=1,v1=00"))
                .set_payload(body.to_string())
                .to_request(),
        )
        .await
    }

    #[actix_web::test]
    async fn completed_checkout_settles() {
        let mut ports = accepting(MockPorts::default());
        ports
            .settlement
            .expect_confirm_settlement()
            .withf(|confirmation| {
                confirmation.paid
                    && confirmation.payment_link.as_deref() == Some("plink_1")
                    && confirmation.metadata
                        == metadata(&[
                            ("case_id", "c"),
                            ("payment_link_id", ""),
                            ("quote_id", QUOTE_ID),
                        ])
            })
            .times(1)
            .return_once(|_| {
                Ok(SettlementReceipt {
                    payment_id: PaymentId::random(),
                    quote_id: QUOTE_ID.parse::<QuoteId>().expect("id"),
                    case_id: CaseId::random(),
                })
            });

        let res = deliver(ports, &completed_event("paid")).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "status": "settled" }));
    }

    #[rstest]
    #[case::duplicate(Error::conflict("quote was already processed"), "already_processed")]
    #[case::unpaid(Error::invalid_state("payment not completed"), "ignored")]
    #[actix_web::test]
    async fn terminal_outcomes_are_acknowledged(#[case] error: Error, #[case] status: &str) {
        let mut ports = accepting(MockPorts::default());
        ports
            .settlement
            .expect_confirm_settlement()
            .return_once(move |_| Err(error));

        let res = deliver(ports, &completed_event("unpaid")).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], status);
    }

    #[actix_web::test]
    async fn unknown_reference_is_not_found_so_provider_retries() {
        let mut ports = accepting(MockPorts::default());
        ports
            .settlement
            .expect_confirm_settlement()
            .return_once(|_| Err(Error::not_found("payment link reference not found")));

        let res = deliver(ports, &completed_event("paid")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn other_event_types_are_ignored() {
        let ports = accepting(MockPorts::default());
        let res = deliver(ports, &json!({ "type": "payment_intent.created" })).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "ignored");
    }

    #[actix_web::test]
    async fn bad_signature_is_rejected_before_parsing() {
        let mut ports = MockPorts::default();
        ports
            .webhooks
            .expect_verify()
            .returning(|_, _| Err(WebhookAuthError::signature_mismatch()));

        let res = deliver(ports, &json!("not even an event")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_signature_header_is_rejected() {
        let app = app(MockPorts::default()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/webhooks/stripe")
                .set_payload(completed_event("paid").to_string())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn malformed_event_is_rejected() {
        let ports = accepting(MockPorts::default());
        let res = deliver(ports, &json!({ "no_type": true })).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

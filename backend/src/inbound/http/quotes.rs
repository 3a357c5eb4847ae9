//! Quote listing for lawyers and quote acceptance for clients.
//!
//! ```text
//! GET  /api/v1/lawyer/quotes?status=proposed&page=1
//! POST /api/v1/client/quotes/accept {"quote_id":"..."}
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::AcceptanceResponse;
use crate::domain::{Error, QuoteId, QuoteStatus, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::dto::{PageQuery, PageResponse, QuoteResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_id, parse_optional};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LawyerQuotesParams {
    /// `proposed`, `accepted` or `rejected`.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Body for `POST /api/v1/client/quotes/accept`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AcceptQuoteRequest {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub quote_id: Option<String>,
}

/// Payment link issued for an accepted quote.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AcceptQuoteResponse {
    pub payment_intent_id: String,
    pub payment_link_url: String,
}

impl From<AcceptanceResponse> for AcceptQuoteResponse {
    fn from(value: AcceptanceResponse) -> Self {
        Self {
            payment_intent_id: value.payment_intent_id,
            payment_link_url: value.payment_link_url,
        }
    }
}

/// The signed-in lawyer's quotes, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/v1/lawyer/quotes",
    params(LawyerQuotesParams),
    responses(
        (status = 200, description = "Lawyer quotes", body = PageResponse<QuoteResponse>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Lawyers only", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["quotes"],
    operation_id = "listLawyerQuotes"
)]
#[get("/lawyer/quotes")]
pub async fn list_lawyer_quotes(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LawyerQuotesParams>,
) -> ApiResult<web::Json<PageResponse<QuoteResponse>>> {
    let actor = session.require_role(Role::Lawyer)?;
    let LawyerQuotesParams {
        status,
        page,
        page_size,
    } = query.into_inner();
    let status: Option<QuoteStatus> = parse_optional(status.as_deref(), FieldName::new("status"))?;
    let quotes = state
        .quote_query
        .list_lawyer_quotes(&actor.user_id, status, PageQuery { page, page_size }.to_request())
        .await?;
    Ok(web::Json(PageResponse::from_page(quotes, Into::into)))
}

/// Start settlement of a quote: returns a payable link for the client.
///
/// The quote stays `proposed` until the payment provider confirms payment.
#[utoipa::path(
    post,
    path = "/api/v1/client/quotes/accept",
    request_body = AcceptQuoteRequest,
    responses(
        (status = 200, description = "Payment link issued", body = AcceptQuoteResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the case owner", body = ErrorSchema),
        (status = 404, description = "Quote or case not found", body = ErrorSchema),
        (status = 409, description = "Case already has an accepted quote", body = ErrorSchema),
        (status = 422, description = "Quote or case not in an acceptable state", body = ErrorSchema),
        (status = 502, description = "Payment provider failure", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["quotes"],
    operation_id = "acceptQuote"
)]
#[post("/client/quotes/accept")]
pub async fn accept_quote(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AcceptQuoteRequest>,
) -> ApiResult<web::Json<AcceptQuoteResponse>> {
    let actor = session.require_role(Role::Client)?;
    let field = FieldName::new("quote_id");
    let raw = payload
        .into_inner()
        .quote_id
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| missing_field_error(field))?;
    let quote_id: QuoteId = parse_id(&raw, field)?;
    let response = state
        .settlement
        .request_acceptance(&quote_id, &actor.user_id)
        .await?;
    Ok(web::Json(response.into()))
}

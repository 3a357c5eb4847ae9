//! Lawyer marketplace handlers: browsing open cases and quoting on them.
//!
//! ```text
//! GET  /api/v1/lawyer/marketplace?category=property&created_since=2026-01-01T00:00:00Z
//! GET  /api/v1/lawyer/marketplace/cases/{case_id}
//! POST /api/v1/lawyer/marketplace/cases/{case_id}/quotes {"amount":"1500.00","expected_days":14,"note":"..."}
//! PUT  /api/v1/lawyer/marketplace/cases/{case_id}/quotes
//! GET  /api/v1/lawyer/marketplace/cases/{case_id}/quotes/my
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::QuoteSubmission;
use crate::domain::{Actor, CaseId, Error, OpenCaseFilter, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::dto::{
    CaseResponse, MarketplaceCaseDetailResponse, MyQuoteResponse, PageQuery, PageResponse,
    QuoteResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_optional_rfc3339_timestamp};

/// Marketplace listing filters plus pagination.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MarketplaceQueryParams {
    pub category: Option<String>,
    /// RFC 3339 lower bound on the case creation time.
    pub created_since: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Quote terms for submit and update.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuoteRequest {
    /// Exact decimal string in major units.
    #[schema(example = "1234.56")]
    pub amount: String,
    #[schema(minimum = 1)]
    pub expected_days: i64,
    #[serde(default)]
    pub note: String,
}

fn case_id_from(path: &str) -> Result<CaseId, Error> {
    parse_id(path, FieldName::new("case_id"))
}

fn submission(actor: &Actor, case_id: CaseId, body: QuoteRequest) -> QuoteSubmission {
    QuoteSubmission {
        case_id,
        lawyer_id: actor.user_id,
        amount: body.amount,
        expected_days: body.expected_days,
        note: body.note,
    }
}

/// Browse open cases; descriptions are anonymized.
#[utoipa::path(
    get,
    path = "/api/v1/lawyer/marketplace",
    params(MarketplaceQueryParams),
    responses(
        (status = 200, description = "Open cases", body = PageResponse<CaseResponse>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Lawyers only", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["marketplace"],
    operation_id = "listOpenCases"
)]
#[get("/lawyer/marketplace")]
pub async fn list_open_cases(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<MarketplaceQueryParams>,
) -> ApiResult<web::Json<PageResponse<CaseResponse>>> {
    session.require_role(Role::Lawyer)?;
    let MarketplaceQueryParams {
        category,
        created_since,
        page,
        page_size,
    } = query.into_inner();
    let filter = OpenCaseFilter {
        category: category.filter(|value| !value.trim().is_empty()),
        created_since: parse_optional_rfc3339_timestamp(
            created_since,
            FieldName::new("created_since"),
        )?,
    };
    let page = PageQuery { page, page_size }.to_request();
    let cases = state.marketplace.list_open_cases(filter, page).await?;
    Ok(web::Json(PageResponse::from_page(cases, Into::into)))
}

/// Case detail as visible to the signed-in lawyer.
#[utoipa::path(
    get,
    path = "/api/v1/lawyer/marketplace/cases/{case_id}",
    params(("case_id" = String, Path, description = "Case identifier")),
    responses(
        (status = 200, description = "Case detail", body = MarketplaceCaseDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Lawyers only", body = ErrorSchema),
        (status = 404, description = "Case not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["marketplace"],
    operation_id = "marketplaceCaseDetail"
)]
#[get("/lawyer/marketplace/cases/{case_id}")]
pub async fn marketplace_case_detail(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MarketplaceCaseDetailResponse>> {
    let actor = session.require_role(Role::Lawyer)?;
    let case_id = case_id_from(&path)?;
    let detail = state.marketplace.case_detail(&actor, &case_id).await?;
    Ok(web::Json(detail.into()))
}

/// Submit a quote on an open case.
#[utoipa::path(
    post,
    path = "/api/v1/lawyer/marketplace/cases/{case_id}/quotes",
    params(("case_id" = String, Path, description = "Case identifier")),
    request_body = QuoteRequest,
    responses(
        (status = 201, description = "Quote submitted", body = QuoteResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Lawyers only", body = ErrorSchema),
        (status = 404, description = "Case not found", body = ErrorSchema),
        (status = 409, description = "Already quoted", body = ErrorSchema),
        (status = 422, description = "Case is not open", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["quotes"],
    operation_id = "submitQuote"
)]
#[post("/lawyer/marketplace/cases/{case_id}/quotes")]
pub async fn submit_quote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<QuoteRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_role(Role::Lawyer)?;
    let case_id = case_id_from(&path)?;
    let quote = state
        .quote_command
        .submit_quote(submission(&actor, case_id, payload.into_inner()))
        .await?;
    Ok(HttpResponse::Created().json(QuoteResponse::from(quote)))
}

/// Revise the signed-in lawyer's proposed quote.
#[utoipa::path(
    put,
    path = "/api/v1/lawyer/marketplace/cases/{case_id}/quotes",
    params(("case_id" = String, Path, description = "Case identifier")),
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Quote updated", body = QuoteResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Lawyers only", body = ErrorSchema),
        (status = 404, description = "No quote to update", body = ErrorSchema),
        (status = 422, description = "Quote is no longer proposed", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["quotes"],
    operation_id = "updateQuote"
)]
#[put("/lawyer/marketplace/cases/{case_id}/quotes")]
pub async fn update_quote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<QuoteRequest>,
) -> ApiResult<web::Json<QuoteResponse>> {
    let actor = session.require_role(Role::Lawyer)?;
    let case_id = case_id_from(&path)?;
    let quote = state
        .quote_command
        .update_quote(submission(&actor, case_id, payload.into_inner()))
        .await?;
    Ok(web::Json(quote.into()))
}

/// The signed-in lawyer's quote on a case, if any.
#[utoipa::path(
    get,
    path = "/api/v1/lawyer/marketplace/cases/{case_id}/quotes/my",
    params(("case_id" = String, Path, description = "Case identifier")),
    responses(
        (status = 200, description = "Own quote or null", body = MyQuoteResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Lawyers only", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["quotes"],
    operation_id = "myQuote"
)]
#[get("/lawyer/marketplace/cases/{case_id}/quotes/my")]
pub async fn my_quote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MyQuoteResponse>> {
    let actor = session.require_role(Role::Lawyer)?;
    let case_id = case_id_from(&path)?;
    let quote = state
        .quote_query
        .quote_by_case_and_lawyer(&case_id, &actor.user_id)
        .await?;
    Ok(web::Json(MyQuoteResponse {
        quote: quote.map(Into::into),
    }))
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

    use crate::domain::ports::MarketplaceCaseDetail;
    use crate::domain::{CaseDetailAccess, CaseStatus, Page, QuoteStatus, anonymize};
    use crate::inbound::http::test_utils::{
        CASE_ID, CLIENT_ID, LAWYER_ID, MockPorts, SIGN_IN_PATH, case, quote, sign_in,
        test_session_middleware, test_sign_in,
    };

    async fn app(
        ports: MockPorts,
    ) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
        test::init_service(
            App::new()
                .app_data(ports.into_state())
                .wrap(test_session_middleware())
                .route(SIGN_IN_PATH, web::get().to(test_sign_in))
                .service(
                    web::scope("/api/v1")
                        .service(list_open_cases)
                        .service(marketplace_case_detail)
                        .service(submit_quote)
                        .service(update_quote)
                        .service(my_quote),
                ),
        )
        .await
    }

    async fn lawyer_get(ports: MockPorts, uri: &str) -> ServiceResponse<BoxBody> {
        let app = app(ports).await;
        let cookie = sign_in(&app, LAWYER_ID, Role::Lawyer).await;
        test::call_service(
            &app,
            test::TestRequest::get().uri(uri).cookie(cookie).to_request(),
        )
        .await
    }

    #[actix_web::test]
    async fn listing_passes_filters_through() {
        let mut ports = MockPorts::default();
        ports
            .marketplace
            .expect_list_open_cases()
            .withf(|filter, _| {
                filter.category.as_deref() == Some("property") && filter.created_since.is_some()
            })
            .return_once(|_, page| {
                let mut open = case(CaseStatus::Open);
                open.description = anonymize(&open.description);
                Ok(Page::new(vec![open], page, 1))
            });

        let res = lawyer_get(
            ports,
            "/api/v1/lawyer/marketplace?category=property&created_since=2026-01-01T00:00:00Z",
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["total"], 1);
        let description = body["data"][0]["description"].as_str().expect("description");
        assert!(!description.contains("555-123-4567"), "{description}");
    }

    #[actix_web::test]
    async fn listing_rejects_malformed_timestamps() {
        let res = lawyer_get(
            MockPorts::default(),
            "/api/v1/lawyer/marketplace?created_since=last-week",
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn clients_cannot_browse_marketplace() {
        let app = app(MockPorts::default()).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/lawyer/marketplace")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[case(CaseDetailAccess::Redacted, true)]
    #[case(CaseDetailAccess::Full, false)]
    #[actix_web::test]
    async fn detail_reports_redaction(#[case] access: CaseDetailAccess, #[case] redacted: bool) {
        let mut ports = MockPorts::default();
        ports
            .marketplace
            .expect_case_detail()
            .return_once(move |_, _| {
                Ok(MarketplaceCaseDetail {
                    case: case(CaseStatus::Engaged),
                    access,
                    has_submitted: true,
                    files: Vec::new(),
                })
            });

        let res = lawyer_get(ports, &format!("/api/v1/lawyer/marketplace/cases/{CASE_ID}")).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["redacted"], redacted);
        assert_eq!(body["has_submitted"], true);
    }

    #[actix_web::test]
    async fn submit_builds_submission_from_session_and_path() {
        let mut ports = MockPorts::default();
        ports
            .quote_command
            .expect_submit_quote()
            .withf(|submission| {
                submission.case_id.to_string() == CASE_ID
                    && submission.lawyer_id.to_string() == LAWYER_ID
                    && submission.amount == "1234.56"
                    && submission.expected_days == 14
            })
            .times(1)
            .return_once(|_| Ok(quote(QuoteStatus::Proposed)));
        let app = app(ports).await;
        let cookie = sign_in(&app, LAWYER_ID, Role::Lawyer).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/lawyer/marketplace/cases/{CASE_ID}/quotes"))
                .cookie(cookie)
                .set_json(json!({ "amount": "1234.56", "expected_days": 14, "note": "Fixed fee" }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "proposed");
    }

    #[rstest]
    #[case::duplicate(Error::conflict("already quoted"), StatusCode::CONFLICT)]
    #[case::closed(Error::invalid_state("case is not open"), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case::bad_amount(Error::invalid_request("amount"), StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn submit_surfaces_service_errors(#[case] error: Error, #[case] status: StatusCode) {
        let mut ports = MockPorts::default();
        ports
            .quote_command
            .expect_submit_quote()
            .return_once(move |_| Err(error));
        let app = app(ports).await;
        let cookie = sign_in(&app, LAWYER_ID, Role::Lawyer).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/lawyer/marketplace/cases/{CASE_ID}/quotes"))
                .cookie(cookie)
                .set_json(json!({ "amount": "10", "expected_days": 1 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), status);
    }

    #[actix_web::test]
    async fn update_uses_put() {
        let mut ports = MockPorts::default();
        ports
            .quote_command
            .expect_update_quote()
            .withf(|submission| submission.amount == "900")
            .return_once(|_| Ok(quote(QuoteStatus::Proposed)));
        let app = app(ports).await;
        let cookie = sign_in(&app, LAWYER_ID, Role::Lawyer).await;

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/lawyer/marketplace/cases/{CASE_ID}/quotes"))
                .cookie(cookie)
                .set_json(json!({ "amount": "900", "expected_days": 7, "note": "" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn my_quote_is_null_when_absent() {
        let mut ports = MockPorts::default();
        ports
            .quote_query
            .expect_quote_by_case_and_lawyer()
            .return_once(|_, _| Ok(None));

        let res = lawyer_get(
            ports,
            &format!("/api/v1/lawyer/marketplace/cases/{CASE_ID}/quotes/my"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "quote": null }));
    }
}

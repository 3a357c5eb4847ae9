//! Client case handlers.
//!
//! ```text
//! POST /api/v1/client/cases {"title":"Lease dispute","category":"property","description":"..."}
//! GET  /api/v1/client/cases?page=1&page_size=10
//! GET  /api/v1/client/cases/{case_id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{CaseDraft, CaseId, Error, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::dto::{
    CaseResponse, CaseSummaryResponse, ClientCaseDetailResponse, PageQuery, PageResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, parse_id};

/// Request body for `POST /api/v1/client/cases`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateCaseRequest {
    pub title: String,
    pub category: String,
    pub description: String,
}

/// Open a new case owned by the signed-in client.
#[utoipa::path(
    post,
    path = "/api/v1/client/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created", body = CaseResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Clients only", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["cases"],
    operation_id = "createCase"
)]
#[post("/client/cases")]
pub async fn create_case(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCaseRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_role(Role::Client)?;
    let CreateCaseRequest {
        title,
        category,
        description,
    } = payload.into_inner();
    let draft = CaseDraft::new(&title, &category, &description)
        .map_err(|err| invalid_field_error(FieldName::new("case"), err))?;
    let case = state.case_command.create_case(&actor.user_id, draft).await?;
    Ok(HttpResponse::Created().json(CaseResponse::from(case)))
}

/// List the signed-in client's cases with quote counts.
#[utoipa::path(
    get,
    path = "/api/v1/client/cases",
    params(PageQuery),
    responses(
        (status = 200, description = "Client cases", body = PageResponse<CaseSummaryResponse>),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Clients only", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["cases"],
    operation_id = "listClientCases"
)]
#[get("/client/cases")]
pub async fn list_client_cases(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<PageResponse<CaseSummaryResponse>>> {
    let actor = session.require_role(Role::Client)?;
    let page = state
        .case_query
        .list_client_cases(&actor.user_id, query.to_request())
        .await?;
    Ok(web::Json(PageResponse::from_page(page, Into::into)))
}

/// Case detail with quotes and signed file links; owner only.
#[utoipa::path(
    get,
    path = "/api/v1/client/cases/{case_id}",
    params(("case_id" = String, Path, description = "Case identifier")),
    responses(
        (status = 200, description = "Case detail", body = ClientCaseDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the case owner", body = ErrorSchema),
        (status = 404, description = "Case not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["cases"],
    operation_id = "clientCaseDetail"
)]
#[get("/client/cases/{case_id}")]
pub async fn client_case_detail(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ClientCaseDetailResponse>> {
    let actor = session.require_role(Role::Client)?;
    let case_id: CaseId = parse_id(&path, FieldName::new("case_id"))?;
    let detail = state.case_query.client_case_detail(&actor, &case_id).await?;
    Ok(web::Json(detail.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_http::Request;
    use actix_web::body::BoxBody;
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::domain::ports::{CaseFileGrant, ClientCaseDetail, DownloadGrant};
    use crate::domain::{
        CaseFile, CaseStatus, CaseSummary, Page, PageRequest, QuoteStatus, UserId,
    };
    use crate::inbound::http::test_utils::{
        CASE_ID, CLIENT_ID, LAWYER_ID, MockPorts, SIGN_IN_PATH, case, fixed_now, quote, sign_in,
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
                        .service(create_case)
                        .service(list_client_cases)
                        .service(client_case_detail),
                ),
        )
        .await
    }

    #[actix_web::test]
    async fn creates_case_for_signed_in_client() {
        let mut ports = MockPorts::default();
        ports
            .case_command
            .expect_create_case()
            .withf(|client, draft| {
                client.to_string() == CLIENT_ID && draft.title() == "Lease dispute"
            })
            .times(1)
            .return_once(|_, _| Ok(case(CaseStatus::Open)));
        let app = app(ports).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/client/cases")
                .cookie(cookie)
                .set_json(json!({
                    "title": "Lease dispute",
                    "category": "property",
                    "description": "Deposit withheld"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "open");
        assert_eq!(body["client_id"], CLIENT_ID);
    }

    #[actix_web::test]
    async fn blank_title_is_rejected() {
        let app = app(MockPorts::default()).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/client/cases")
                .cookie(cookie)
                .set_json(json!({ "title": "  ", "category": "property", "description": "x" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn lawyers_cannot_create_cases() {
        let app = app(MockPorts::default()).await;
        let cookie = sign_in(&app, LAWYER_ID, Role::Lawyer).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/client/cases")
                .cookie(cookie)
                .set_json(json!({ "title": "t", "category": "c", "description": "d" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn lists_cases_with_page_envelope() {
        let mut ports = MockPorts::default();
        ports
            .case_query
            .expect_list_client_cases()
            .withf(|_, page| *page == PageRequest::new(Some(2), Some(5)))
            .return_once(|_, page| {
                Ok(Page::new(
                    vec![CaseSummary {
                        case: case(CaseStatus::Open),
                        quote_count: 3,
                    }],
                    page,
                    6,
                ))
            });
        let app = app(ports).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/client/cases?page=2&page_size=5")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["page"], 2);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["data"][0]["quote_count"], 3);
    }

    #[actix_web::test]
    async fn detail_includes_quotes_and_signed_files() {
        let mut ports = MockPorts::default();
        ports
            .case_query
            .expect_client_case_detail()
            .withf(|actor, case_id| {
                actor.user_id == CLIENT_ID.parse::<UserId>().expect("id")
                    && case_id.to_string() == CASE_ID
            })
            .return_once(|_, _| {
                let case = case(CaseStatus::Open);
                Ok(ClientCaseDetail {
                    files: vec![CaseFileGrant {
                        file: CaseFile {
                            id: crate::domain::CaseFileId::random(),
                            case_id: case.id,
                            file_name: "lease.pdf".to_owned(),
                            storage_path: format!("cases/{}/ab_1.pdf", case.id),
                            file_size: 42,
                            mime_type: "application/pdf".to_owned(),
                            created_at: fixed_now(),
                        },
                        grant: DownloadGrant {
                            download_url: "http://files/cases/x?signature=y".to_owned(),
                            expires_in_seconds: 3600,
                        },
                    }],
                    quotes: vec![quote(QuoteStatus::Proposed)],
                    case,
                })
            });
        let app = app(ports).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/client/cases/{CASE_ID}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["quotes"][0]["amount"], "1234.56");
        assert_eq!(body["files"][0]["expires_in_seconds"], 3600);
        assert!(body["files"][0].get("storage_path").is_none());
    }

    #[actix_web::test]
    async fn malformed_case_id_is_rejected() {
        let app = app(MockPorts::default()).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/client/cases/not-a-uuid")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn foreign_case_is_forbidden() {
        let mut ports = MockPorts::default();
        ports
            .case_query
            .expect_client_case_detail()
            .return_once(|_, _| Err(Error::forbidden("not your case")));
        let app = app(ports).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/client/cases/{CASE_ID}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}

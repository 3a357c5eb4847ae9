//! Case file upload, download grants, and signed raw downloads.
//!
//! ```text
//! POST /api/v1/client/cases/{case_id}/files?filename=lease.pdf   (raw body)
//! GET  /api/v1/files/{file_id}/download
//! GET  /files/raw/{key}?expires=1760003600&signature=ab12...
//! ```

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use futures_util::StreamExt as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{CaseFileUpload, DownloadGrant, ObjectStorageError};
use crate::domain::{CaseFileId, CaseId, Error, Role, UploadPolicy};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::dto::CaseFileResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_id};

/// Query parameters for the raw upload endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadParams {
    /// Original file name; its extension selects the allowed type.
    pub filename: Option<String>,
}

/// Signed-link parameters for raw downloads.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignedLinkParams {
    pub expires: i64,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DownloadGrantResponse {
    pub download_url: String,
    pub expires_in_seconds: u64,
}

impl From<DownloadGrant> for DownloadGrantResponse {
    fn from(grant: DownloadGrant) -> Self {
        Self {
            download_url: grant.download_url,
            expires_in_seconds: grant.expires_in_seconds,
        }
    }
}

/// Buffer the request body, keeping at most `limit + 1` bytes so the upload
/// policy still sees an oversized file as oversized.
async fn read_capped(mut payload: web::Payload, limit: u64) -> Result<Vec<u8>, Error> {
    let cap = usize::try_from(limit.saturating_add(1)).unwrap_or(usize::MAX);
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|error| Error::invalid_request(format!("failed to read body: {error}")))?;
        let room = cap.saturating_sub(body.len());
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= cap {
            break;
        }
    }
    Ok(body)
}

fn declared_content_type(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_owned())
        .filter(|value| !value.is_empty() && value != "application/octet-stream")
}

/// Attach a PDF or PNG to a case the signed-in client owns.
#[utoipa::path(
    post,
    path = "/api/v1/client/cases/{case_id}/files",
    params(("case_id" = String, Path, description = "Case identifier"), UploadParams),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "File stored", body = CaseFileResponse),
        (status = 400, description = "Missing name, disallowed type or size", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the case owner", body = ErrorSchema),
        (status = 404, description = "Case not found", body = ErrorSchema),
        (status = 422, description = "Per-case file quota reached", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["files"],
    operation_id = "uploadCaseFile"
)]
#[post("/client/cases/{case_id}/files")]
pub async fn upload_case_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<UploadParams>,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let actor = session.require_role(Role::Client)?;
    let case_id: CaseId = parse_id(&path, FieldName::new("case_id"))?;
    let file_name = query
        .into_inner()
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| missing_field_error(FieldName::new("filename")))?;
    let bytes = read_capped(payload, UploadPolicy::default().max_bytes).await?;

    let file = state
        .case_files
        .upload(
            &actor,
            CaseFileUpload {
                case_id,
                file_name,
                content_type: declared_content_type(&req),
                bytes,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(CaseFileResponse::from(file)))
}

/// Issue a one-hour download link for a case file.
#[utoipa::path(
    get,
    path = "/api/v1/files/{file_id}/download",
    params(("file_id" = String, Path, description = "Case file identifier")),
    responses(
        (status = 200, description = "Signed download link", body = DownloadGrantResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not permitted to download", body = ErrorSchema),
        (status = 404, description = "File not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["files"],
    operation_id = "downloadCaseFile"
)]
#[get("/files/{file_id}/download")]
pub async fn download_case_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DownloadGrantResponse>> {
    let actor = session.require_actor()?;
    let file_id: CaseFileId = parse_id(&path, FieldName::new("file_id"))?;
    let grant = state.case_files.download_grant(&actor, &file_id).await?;
    Ok(web::Json(grant.into()))
}

fn map_signed_read_error(error: ObjectStorageError) -> Error {
    match error {
        ObjectStorageError::InvalidSignature | ObjectStorageError::InvalidKey { .. } => {
            Error::forbidden("download link is invalid or expired")
        }
        ObjectStorageError::NotFound { .. } => Error::not_found("file not found"),
        other => Error::internal(format!("failed to read object: {other}")),
    }
}

/// Serve an object behind a signed, expiring link.
#[utoipa::path(
    get,
    path = "/files/raw/{key}",
    params(("key" = String, Path, description = "Object key"), SignedLinkParams),
    responses(
        (status = 200, description = "File contents"),
        (status = 403, description = "Link invalid or expired", body = ErrorSchema),
        (status = 404, description = "File not found", body = ErrorSchema)
    ),
    tags = ["files"],
    operation_id = "rawFile",
    security([])
)]
#[get("/files/raw/{key:.*}")]
pub async fn raw_file(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<SignedLinkParams>,
) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let SignedLinkParams { expires, signature } = query.into_inner();
    let bytes = state
        .signed_objects
        .read_signed(&key, expires, &signature)
        .await
        .map_err(map_signed_read_error)?;
    let mime = UploadPolicy::default()
        .extension_for(&key)
        .map(|allowed| allowed.mime_type)
        .unwrap_or("application/octet-stream");
    debug!(%key, size = bytes.len(), "serving signed object");
    Ok(HttpResponse::Ok()
        .content_type(mime)
        .insert_header((header::CACHE_CONTROL, "private, no-store"))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_http::Request;
    use actix_web::body::BoxBody;
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use mockall::predicate::{always, eq};
    use rstest::rstest;
    use serde_json::Value;

    use crate::domain::CaseFile;
    use crate::inbound::http::test_utils::{
        CASE_ID, CLIENT_ID, LAWYER_ID, MockPorts, SIGN_IN_PATH, fixed_now, sign_in,
        test_session_middleware, test_sign_in,
    };

    const KEY: &str = "cases/33333333-3333-4333-8333-333333333333/ab12_1760000000.pdf";

    async fn app(
        ports: MockPorts,
    ) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
        test::init_service(
            App::new()
                .app_data(ports.into_state())
                .wrap(test_session_middleware())
                .route(SIGN_IN_PATH, web::get().to(test_sign_in))
                .service(raw_file)
                .service(
                    web::scope("/api/v1")
                        .service(upload_case_file)
                        .service(download_case_file),
                ),
        )
        .await
    }

    fn stored(case_id: CaseId, size: u64) -> CaseFile {
        CaseFile {
            id: CaseFileId::random(),
            case_id,
            file_name: "lease.pdf".to_owned(),
            storage_path: KEY.to_owned(),
            file_size: size,
            mime_type: "application/pdf".to_owned(),
            created_at: fixed_now(),
        }
    }

    #[actix_web::test]
    async fn upload_forwards_raw_body_and_declared_type() {
        let mut ports = MockPorts::default();
        ports
            .case_files
            .expect_upload()
            .withf(|actor, upload| {
                actor.role == Role::Client
                    && upload.case_id.to_string() == CASE_ID
                    && upload.file_name == "lease.pdf"
                    && upload.content_type.as_deref() == Some("application/pdf")
                    && upload.bytes == b"%PDF-1.7"
            })
            .times(1)
            .return_once(|_, upload| Ok(stored(upload.case_id, 8)));
        let app = app(ports).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/client/cases/{CASE_ID}/files?filename=lease.pdf"))
                .cookie(cookie)
                .insert_header((header::CONTENT_TYPE, "application/pdf"))
                .set_payload(&b"%PDF-1.7"[..])
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["file_size"], 8);
        assert!(body["download_url"].is_null());
    }

    #[actix_web::test]
    async fn oversized_bodies_reach_the_policy_capped() {
        let limit = UploadPolicy::default().max_bytes;
        let mut ports = MockPorts::default();
        ports
            .case_files
            .expect_upload()
            .withf(move |_, upload| upload.bytes.len() as u64 == limit + 1)
            .return_once(|_, _| Err(Error::invalid_request("file exceeds 10 MiB")));
        let app = app(ports).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let oversized = vec![0_u8; usize::try_from(limit).expect("fits") + 4096];
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/client/cases/{CASE_ID}/files?filename=big.pdf"))
                .cookie(cookie)
                .set_payload(oversized)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn upload_requires_file_name() {
        let app = app(MockPorts::default()).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/client/cases/{CASE_ID}/files"))
                .cookie(cookie)
                .set_payload(&b"x"[..])
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn quota_exhaustion_is_unprocessable() {
        let mut ports = MockPorts::default();
        ports
            .case_files
            .expect_upload()
            .return_once(|_, _| Err(Error::quota_exceeded("case already has 10 files")));
        let app = app(ports).await;
        let cookie = sign_in(&app, CLIENT_ID, Role::Client).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/client/cases/{CASE_ID}/files?filename=a.png"))
                .cookie(cookie)
                .set_payload(&b"png"[..])
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "quota_exceeded");
    }

    #[actix_web::test]
    async fn download_grant_for_lawyer_session() {
        let file_id = CaseFileId::random();
        let mut ports = MockPorts::default();
        ports
            .case_files
            .expect_download_grant()
            .with(always(), eq(file_id))
            .return_once(|_, _| {
                Ok(DownloadGrant {
                    download_url: "http://localhost:8080/files/raw/x?expires=1&signature=00"
                        .to_owned(),
                    expires_in_seconds: 3600,
                })
            });
        let app = app(ports).await;
        let cookie = sign_in(&app, LAWYER_ID, Role::Lawyer).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/files/{file_id}/download"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["expires_in_seconds"], 3600);
    }

    #[actix_web::test]
    async fn raw_download_serves_bytes_with_derived_type() {
        let mut ports = MockPorts::default();
        ports
            .signed_objects
            .expect_read_signed()
            .withf(|key, expires, signature| {
                key == KEY && *expires == 1_760_003_600 && signature == "ab12"
            })
            .return_once(|_, _, _| Ok(b"%PDF-1.7".to_vec()));
        let app = app(ports).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/files/raw/{KEY}?expires=1760003600&signature=ab12"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).expect("content type"),
            "application/pdf"
        );
        assert_eq!(test::read_body(res).await, &b"%PDF-1.7"[..]);
    }

    #[rstest]
    #[case(ObjectStorageError::invalid_signature(), StatusCode::FORBIDDEN)]
    #[case(ObjectStorageError::not_found(KEY), StatusCode::NOT_FOUND)]
    #[case(ObjectStorageError::io("disk"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[actix_web::test]
    async fn raw_download_failures(#[case] error: ObjectStorageError, #[case] status: StatusCode) {
        let mut ports = MockPorts::default();
        ports
            .signed_objects
            .expect_read_signed()
            .return_once(move |_, _, _| Err(error));
        let app = app(ports).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/files/raw/{KEY}?expires=1&signature=00"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), status);
    }
}

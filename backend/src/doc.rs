//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint of the inbound layer, the schema
//! wrappers for domain errors ([`ErrorSchema`], [`ErrorCodeSchema`]) and the
//! session cookie security scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` exports it for external tooling.

use crate::inbound::http::auth::{LoginRequest, SignupRequest};
use crate::inbound::http::client_cases::CreateCaseRequest;
use crate::inbound::http::dto::{
    CaseFileResponse, CaseResponse, CaseSummaryResponse, ClientCaseDetailResponse,
    MarketplaceCaseDetailResponse, MyQuoteResponse, QuoteResponse, UserResponse,
};
use crate::inbound::http::files::DownloadGrantResponse;
use crate::inbound::http::marketplace::QuoteRequest;
use crate::inbound::http::quotes::{AcceptQuoteRequest, AcceptQuoteResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::webhooks::WebhookAck;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login or /api/v1/auth/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Docket API",
        description = "Legal-services marketplace: cases, quotes, settlement and case files."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::signup,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::profile,
        crate::inbound::http::client_cases::create_case,
        crate::inbound::http::client_cases::list_client_cases,
        crate::inbound::http::client_cases::client_case_detail,
        crate::inbound::http::marketplace::list_open_cases,
        crate::inbound::http::marketplace::marketplace_case_detail,
        crate::inbound::http::marketplace::submit_quote,
        crate::inbound::http::marketplace::update_quote,
        crate::inbound::http::marketplace::my_quote,
        crate::inbound::http::quotes::list_lawyer_quotes,
        crate::inbound::http::quotes::accept_quote,
        crate::inbound::http::files::upload_case_file,
        crate::inbound::http::files::download_case_file,
        crate::inbound::http::files::raw_file,
        crate::inbound::http::webhooks::stripe_webhook,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        SignupRequest,
        LoginRequest,
        UserResponse,
        CreateCaseRequest,
        CaseResponse,
        CaseSummaryResponse,
        ClientCaseDetailResponse,
        MarketplaceCaseDetailResponse,
        QuoteRequest,
        QuoteResponse,
        MyQuoteResponse,
        AcceptQuoteRequest,
        AcceptQuoteResponse,
        CaseFileResponse,
        DownloadGrantResponse,
        WebhookAck,
    )),
    tags(
        (name = "auth", description = "Sign-up, login and the current profile"),
        (name = "cases", description = "Client-owned legal cases"),
        (name = "marketplace", description = "Open cases as seen by lawyers"),
        (name = "quotes", description = "Quote submission and acceptance"),
        (name = "files", description = "Case file uploads and signed downloads"),
        (name = "webhooks", description = "Payment-provider callbacks"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

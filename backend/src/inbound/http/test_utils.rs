//! Test helpers for inbound HTTP components.

use std::collections::BTreeMap;
use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::ports::{
    MockAccountService, MockCaseCommand, MockCaseFileCommand, MockCaseQuery,
    MockMarketplaceQuery, MockQuoteCommand, MockQuoteQuery, MockSettlementCommand,
    MockSignedObjectReader, MockWebhookAuthenticator,
};
use crate::domain::{
    Case, CaseId, Error, CaseStatus, EmailAddress, Quote, QuoteAmount, QuoteId, QuoteStatus, Role, User,
    UserId,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

pub const CLIENT_ID: &str = "11111111-1111-4111-8111-111111111111";
pub const LAWYER_ID: &str = "22222222-2222-4222-8222-222222222222";
pub const CASE_ID: &str = "33333333-3333-4333-8333-333333333333";
pub const QUOTE_ID: &str = "44444444-4444-4444-8444-444444444444";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Extract the session cookie set by a response.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Route pattern for [`test_sign_in`]; mount it inside the session middleware.
pub const SIGN_IN_PATH: &str = "/test/sign-in/{id}/{role}";

/// Test-only handler establishing a session for the given user id and role.
pub async fn test_sign_in(
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, Error> {
    let (id, role) = path.into_inner();
    let role: Role = role.parse().expect("fixture role");
    session.persist_user(&user(&id, role))?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sign in through [`test_sign_in`] and return the session cookie.
pub async fn sign_in<S, B>(app: &S, id: &str, role: Role) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let req = test::TestRequest::get()
        .uri(&format!("/test/sign-in/{id}/{role}"))
        .to_request();
    let res = test::call_service(app, req).await;
    session_cookie(&res)
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.parse().expect("fixture id"),
        email: EmailAddress::parse(&format!("{}@example.com", role.as_str()))
            .expect("fixture email"),
        password_hash: "$argon2id$fixture".to_owned(),
        name: format!("Fixture {role}"),
        role,
        jurisdiction: Some("SG".to_owned()),
        bar_number: (role == Role::Lawyer).then(|| "BAR-1".to_owned()),
        created_at: fixed_now(),
    }
}

pub fn case(status: CaseStatus) -> Case {
    Case {
        id: CASE_ID.parse::<CaseId>().expect("fixture id"),
        client_id: CLIENT_ID.parse::<UserId>().expect("fixture id"),
        title: "Lease dispute".to_owned(),
        category: "property".to_owned(),
        description: "Landlord kept the deposit. Call me on 555-123-4567.".to_owned(),
        status,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub fn quote(status: QuoteStatus) -> Quote {
    Quote {
        id: QUOTE_ID.parse::<QuoteId>().expect("fixture id"),
        case_id: CASE_ID.parse().expect("fixture id"),
        lawyer_id: LAWYER_ID.parse().expect("fixture id"),
        amount: QuoteAmount::parse("1234.56").expect("fixture amount"),
        expected_days: 14,
        note: "Fixed fee".to_owned(),
        status,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub fn metadata(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

/// Mock-backed ports; tests set expectations on the fields they exercise
/// and leave the rest untouched (any call to those panics).
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountService,
    pub case_command: MockCaseCommand,
    pub case_query: MockCaseQuery,
    pub marketplace: MockMarketplaceQuery,
    pub quote_command: MockQuoteCommand,
    pub quote_query: MockQuoteQuery,
    pub settlement: MockSettlementCommand,
    pub case_files: MockCaseFileCommand,
    pub webhooks: MockWebhookAuthenticator,
    pub signed_objects: MockSignedObjectReader,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(HttpStatePorts {
            accounts: Arc::new(self.accounts),
            case_command: Arc::new(self.case_command),
            case_query: Arc::new(self.case_query),
            marketplace: Arc::new(self.marketplace),
            quote_command: Arc::new(self.quote_command),
            quote_query: Arc::new(self.quote_query),
            settlement: Arc::new(self.settlement),
            case_files: Arc::new(self.case_files),
            webhooks: Arc::new(self.webhooks),
            signed_objects: Arc::new(self.signed_objects),
        }))
    }
}

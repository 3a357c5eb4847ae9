//! Account handlers: signup, login and the current profile.
//!
//! ```text
//! POST /api/v1/auth/signup {"email":"a@b.co","password":"hunter22!","name":"Ada","role":"client"}
//! POST /api/v1/auth/login  {"email":"a@b.co","password":"hunter22!"}
//! GET  /api/v1/auth/profile
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, LoginCredentials, SignupDraft, UserValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::dto::UserResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Signup request body for `POST /api/v1/auth/signup`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// `client` or `lawyer`.
    pub role: String,
    pub jurisdiction: Option<String>,
    pub bar_number: Option<String>,
}

impl From<SignupRequest> for SignupDraft {
    fn from(value: SignupRequest) -> Self {
        Self {
            email: value.email,
            password: value.password,
            name: value.name,
            role: value.role,
            jurisdiction: value.jurisdiction,
            bar_number: value.bar_number,
        }
    }
}

/// Login request body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn map_login_validation_error(err: UserValidationError) -> Error {
    let field = match err {
        UserValidationError::InvalidEmail => "email",
        _ => "password",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Register an account and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/auth/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let user = state.accounts.signup(payload.into_inner().into()).await?;
    session.persist_user(&user)?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate and establish a session.
///
/// Unknown emails and wrong passwords both yield `401`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_login_validation_error)?;
    let user = state.accounts.login(credentials).await?;
    session.persist_user(&user)?;
    Ok(web::Json(user.into()))
}

/// Return the signed-in account.
#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "profile"
)]
#[get("/auth/profile")]
pub async fn profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let actor = session.require_actor()?;
    let user = state.accounts.profile(&actor.user_id).await?;
    Ok(web::Json(user.into()))
}

//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod settings;
mod state_builders;

pub use config::ServerConfig;
#[cfg(feature = "metrics")]
pub(crate) use metrics::prometheus_middleware;
pub use settings::DocketSettings;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::{build_adapters, build_http_state, build_ws_state};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::time::Duration;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use docket::Trace;
#[cfg(debug_assertions)]
use docket::doc::ApiDoc;
use docket::inbound::http::auth::{login, profile, signup};
use docket::inbound::http::client_cases::{client_case_detail, create_case, list_client_cases};
use docket::inbound::http::files::{download_case_file, raw_file, upload_case_file};
use docket::inbound::http::health::{HealthState, live, ready};
use docket::inbound::http::session_config::SessionSettings;
use docket::inbound::http::marketplace::{
    list_open_cases, marketplace_case_detail, my_quote, submit_quote, update_quote,
};
use docket::inbound::http::quotes::{accept_quote, list_lawyer_quotes};
use docket::inbound::http::state::HttpState;
use docket::inbound::http::webhooks::stripe_webhook;
use docket::inbound::ws;
use docket::inbound::ws::state::WsState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const SESSION_COOKIE: &str = "session";
const SESSION_TTL_HOURS: i64 = 2;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    session: SessionSettings,
}

/// Private (encrypted) cookie sessions scoped to the API.
fn session_middleware(session: &SessionSettings) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), session.key.clone())
        .cookie_name(SESSION_COOKIE.into())
        .cookie_path("/".into())
        .cookie_secure(session.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(session.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(Duration::hours(SESSION_TTL_HOURS)),
        )
        .build()
}

/// Routes under `/api/v1`.
fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(signup)
        .service(login)
        .service(profile)
        // client
        .service(create_case)
        .service(list_client_cases)
        .service(client_case_detail)
        .service(upload_case_file)
        .service(download_case_file)
        .service(accept_quote)
        // lawyer
        .service(list_open_cases)
        .service(marketplace_case_detail)
        .service(submit_quote)
        .service(update_quote)
        .service(my_quote)
        .service(list_lawyer_quotes)
        .service(stripe_webhook);
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(deps.health_state)
        .app_data(deps.http_state)
        .app_data(deps.ws_state)
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .wrap(session_middleware(&deps.session))
                .configure(api_routes),
        )
        .service(raw_file)
        .service(ws::payment_channel_ws)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Build the adapter graph and bind the HTTP server.
///
/// A bad configuration fails here rather than on the first request.
/// `health_state` is marked ready once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when an adapter cannot be built or the
/// socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let adapters = build_adapters(&config.settings)?;
    let http_state = build_http_state(&config, &adapters);
    let ws_state = build_ws_state(&config.settings, &adapters)?;
    let ServerConfig {
        session,
        bind_addr,
        settings: _,
        db_pool: _,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            session: session.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

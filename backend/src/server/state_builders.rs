//! Builders for the adapter graph behind the HTTP and WebSocket state.
//!
//! Every repository port is served either by the Diesel adapters (when a
//! pool is configured) or by one shared in-memory store. The remaining
//! adapters fall back to fixtures when their credentials are absent.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use docket::domain::ports::{
    CaseFileRepository, CaseRepository, FixturePaymentGateway, ObjectStorage, PaymentGateway,
    PaymentRepository, QuoteRepository, RejectingWebhookAuthenticator, SignedObjectReader,
    TransactionalStore, UserRepository, WebhookAuthenticator,
};
use docket::domain::{
    AccountsService, CaseFileService, CaseService, MarketplaceService, QuoteService,
    SettlementConfig, SettlementPorts, SettlementService, UploadPolicy,
};
use docket::inbound::http::state::{HttpState, HttpStatePorts};
use docket::inbound::ws::state::{OriginAllowList, WsState};
use docket::outbound::memory::InMemoryStore;
use docket::outbound::notifications::BroadcastNotificationHub;
use docket::outbound::persistence::{
    DbPool, DieselCaseFileRepository, DieselCaseRepository, DieselPaymentRepository,
    DieselQuoteRepository, DieselTransactionalStore, DieselUserRepository,
};
use docket::outbound::security::Argon2PasswordHasher;
use docket::outbound::storage::LocalObjectStorage;
use docket::outbound::stripe::{StripePaymentGateway, StripeWebhookVerifier};

use super::ServerConfig;
use super::settings::DocketSettings;

/// Per-request timeout for payment-provider calls.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(20);

/// Adapters shared by both repository choices.
#[derive(Clone)]
pub(super) struct Adapters {
    gateway: Arc<dyn PaymentGateway>,
    webhooks: Arc<dyn WebhookAuthenticator>,
    notifications: Arc<BroadcastNotificationHub>,
    storage: Arc<LocalObjectStorage>,
    clock: Arc<dyn Clock>,
}

/// Repository adapters selected at start-up.
struct Repositories<U, C, Q, P, F> {
    users: Arc<U>,
    cases: Arc<C>,
    quotes: Arc<Q>,
    payments: Arc<P>,
    files: Arc<F>,
    store: Arc<dyn TransactionalStore>,
}

fn build_gateway(settings: &DocketSettings) -> io::Result<Arc<dyn PaymentGateway>> {
    match settings.stripe_secret_key() {
        Some(secret_key) => {
            info!(api_base = settings.stripe_api_base(), "using Stripe payment gateway");
            let gateway =
                StripePaymentGateway::new(settings.stripe_api_base(), secret_key, GATEWAY_TIMEOUT)
                    .map_err(|error| io::Error::other(format!("payment gateway: {error}")))?;
            Ok(Arc::new(gateway))
        }
        None => {
            warn!("DOCKET_STRIPE_SECRET_KEY unset; issuing fixture payment links");
            Ok(Arc::new(FixturePaymentGateway::default()))
        }
    }
}

fn build_webhook_authenticator(
    settings: &DocketSettings,
    clock: Arc<dyn Clock>,
) -> Arc<dyn WebhookAuthenticator> {
    match settings.stripe_webhook_secret() {
        Some(secret) => Arc::new(StripeWebhookVerifier::new(secret, clock)),
        None => {
            warn!("DOCKET_STRIPE_WEBHOOK_SECRET unset; all webhook deliveries will be rejected");
            Arc::new(RejectingWebhookAuthenticator)
        }
    }
}

fn build_storage(
    settings: &DocketSettings,
    clock: Arc<dyn Clock>,
) -> io::Result<Arc<LocalObjectStorage>> {
    let signing_key = match settings.storage_signing_secret() {
        Some(secret) => secret.as_bytes().to_vec(),
        None => {
            warn!("DOCKET_STORAGE_SIGNING_SECRET unset; download links expire on restart");
            rand::random::<[u8; 32]>().to_vec()
        }
    };
    let root = settings.storage_root();
    let storage =
        LocalObjectStorage::open(&root, settings.storage_public_url(), signing_key, clock)
            .map_err(|error| io::Error::other(format!("object storage: {error}")))?;
    info!(root = %root.display(), "object storage ready");
    Ok(Arc::new(storage))
}

/// Build the adapters that do not depend on the repository choice.
///
/// # Errors
///
/// Fails when the Stripe client or the storage root cannot be set up.
pub(super) fn build_adapters(settings: &DocketSettings) -> io::Result<Adapters> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    Ok(Adapters {
        gateway: build_gateway(settings)?,
        webhooks: build_webhook_authenticator(settings, clock.clone()),
        notifications: Arc::new(BroadcastNotificationHub::default()),
        storage: build_storage(settings, clock.clone())?,
        clock,
    })
}

fn wire_ports<U, C, Q, P, F>(
    repos: Repositories<U, C, Q, P, F>,
    adapters: &Adapters,
    settlement: SettlementConfig,
) -> HttpStatePorts
where
    U: UserRepository + 'static,
    C: CaseRepository + 'static,
    Q: QuoteRepository + 'static,
    P: PaymentRepository + 'static,
    F: CaseFileRepository + 'static,
{
    let Repositories {
        users,
        cases,
        quotes,
        payments,
        files,
        store,
    } = repos;
    let storage: Arc<dyn ObjectStorage> = adapters.storage.clone();
    let clock = adapters.clock.clone();

    let case_service = Arc::new(CaseService::new(
        cases.clone(),
        quotes.clone(),
        files.clone(),
        storage.clone(),
        clock.clone(),
    ));
    let quote_service = Arc::new(QuoteService::new(cases.clone(), quotes.clone(), clock.clone()));
    let settlement = SettlementService::new(
        SettlementPorts {
            cases: cases.clone(),
            quotes: quotes.clone(),
            payments,
            store,
            gateway: adapters.gateway.clone(),
            notifications: adapters.notifications.clone(),
        },
        settlement,
        clock.clone(),
    );

    HttpStatePorts {
        accounts: Arc::new(AccountsService::new(
            users,
            Arc::new(Argon2PasswordHasher),
            clock.clone(),
        )),
        case_command: case_service.clone(),
        case_query: case_service,
        marketplace: Arc::new(MarketplaceService::new(
            cases.clone(),
            quotes.clone(),
            files.clone(),
            storage.clone(),
        )),
        quote_command: quote_service.clone(),
        quote_query: quote_service,
        settlement: Arc::new(settlement),
        case_files: Arc::new(CaseFileService::new(
            cases,
            quotes,
            files,
            storage,
            UploadPolicy::default(),
            clock,
        )),
        webhooks: adapters.webhooks.clone(),
        signed_objects: adapters.storage.clone() as Arc<dyn SignedObjectReader>,
    }
}

fn diesel_repositories(
    pool: &DbPool,
) -> Repositories<
    DieselUserRepository,
    DieselCaseRepository,
    DieselQuoteRepository,
    DieselPaymentRepository,
    DieselCaseFileRepository,
> {
    Repositories {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        cases: Arc::new(DieselCaseRepository::new(pool.clone())),
        quotes: Arc::new(DieselQuoteRepository::new(pool.clone())),
        payments: Arc::new(DieselPaymentRepository::new(pool.clone())),
        files: Arc::new(DieselCaseFileRepository::new(pool.clone())),
        store: Arc::new(DieselTransactionalStore::new(pool.clone())),
    }
}

fn memory_repositories(
    store: &Arc<InMemoryStore>,
) -> Repositories<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore> {
    Repositories {
        users: store.clone(),
        cases: store.clone(),
        quotes: store.clone(),
        payments: store.clone(),
        files: store.clone(),
        store: store.clone(),
    }
}

/// Build the shared HTTP state over the configured repositories.
pub(super) fn build_http_state(config: &ServerConfig, adapters: &Adapters) -> web::Data<HttpState> {
    let settlement = config.settings.settlement();
    let ports = match &config.db_pool {
        Some(pool) => wire_ports(diesel_repositories(pool), adapters, settlement),
        None => {
            warn!("DOCKET_DATABASE_URL unset; data lives in memory and is lost on restart");
            wire_ports(
                memory_repositories(&Arc::new(InMemoryStore::new())),
                adapters,
                settlement,
            )
        }
    };
    web::Data::new(HttpState::new(ports))
}

/// Build the WebSocket state fed by the notification hub.
///
/// # Errors
///
/// Fails when a configured origin is not a valid URL.
pub(super) fn build_ws_state(
    settings: &DocketSettings,
    adapters: &Adapters,
) -> io::Result<web::Data<WsState>> {
    let origins = OriginAllowList::parse(settings.allowed_origins())
        .map_err(|error| io::Error::other(format!("DOCKET_ALLOWED_ORIGINS: {error}")))?;
    Ok(web::Data::new(WsState::new(
        adapters.notifications.clone(),
        origins,
    )))
}

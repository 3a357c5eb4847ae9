//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, CaseCommand, CaseFileCommand, CaseQuery, MarketplaceQuery, QuoteCommand,
    QuoteQuery, SettlementCommand, SignedObjectReader, WebhookAuthenticator,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub case_command: Arc<dyn CaseCommand>,
    pub case_query: Arc<dyn CaseQuery>,
    pub marketplace: Arc<dyn MarketplaceQuery>,
    pub quote_command: Arc<dyn QuoteCommand>,
    pub quote_query: Arc<dyn QuoteQuery>,
    pub settlement: Arc<dyn SettlementCommand>,
    pub case_files: Arc<dyn CaseFileCommand>,
    pub webhooks: Arc<dyn WebhookAuthenticator>,
    pub signed_objects: Arc<dyn SignedObjectReader>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub case_command: Arc<dyn CaseCommand>,
    pub case_query: Arc<dyn CaseQuery>,
    pub marketplace: Arc<dyn MarketplaceQuery>,
    pub quote_command: Arc<dyn QuoteCommand>,
    pub quote_query: Arc<dyn QuoteQuery>,
    pub settlement: Arc<dyn SettlementCommand>,
    pub case_files: Arc<dyn CaseFileCommand>,
    /// Verifies payment-provider webhook signatures.
    pub webhooks: Arc<dyn WebhookAuthenticator>,
    /// Serves objects behind signed download URLs.
    pub signed_objects: Arc<dyn SignedObjectReader>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            case_command,
            case_query,
            marketplace,
            quote_command,
            quote_query,
            settlement,
            case_files,
            webhooks,
            signed_objects,
        } = ports;
        Self {
            accounts,
            case_command,
            case_query,
            marketplace,
            quote_command,
            quote_query,
            settlement,
            case_files,
            webhooks,
            signed_objects,
        }
    }
}

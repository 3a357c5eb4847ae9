//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the transactional store, payment gateway,
//! notifications, object storage, password hashing, webhook verification)
//! are implemented under `outbound`. Driving ports are implemented by the
//! domain services and called from `inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod case_command;
mod case_file_command;
mod case_file_repository;
mod case_query;
mod case_repository;
mod marketplace_query;
mod notification_publisher;
mod object_storage;
mod password_hasher;
mod payment_gateway;
mod payment_repository;
mod quote_command;
mod quote_query;
mod quote_repository;
mod repository_error;
mod settlement_command;
mod store_transaction;
mod user_repository;
mod webhook_authenticator;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::AccountService;
#[cfg(test)]
pub use case_command::MockCaseCommand;
pub use case_command::CaseCommand;
#[cfg(test)]
pub use case_file_command::MockCaseFileCommand;
pub use case_file_command::{
    CaseFileCommand, CaseFileGrant, CaseFileUpload, DOWNLOAD_TTL_SECONDS, DownloadGrant,
};
#[cfg(test)]
pub use case_file_repository::MockCaseFileRepository;
pub use case_file_repository::CaseFileRepository;
#[cfg(test)]
pub use case_query::MockCaseQuery;
pub use case_query::{CaseQuery, ClientCaseDetail};
#[cfg(test)]
pub use case_repository::MockCaseRepository;
pub use case_repository::CaseRepository;
#[cfg(test)]
pub use marketplace_query::MockMarketplaceQuery;
pub use marketplace_query::{MarketplaceCaseDetail, MarketplaceQuery};
#[cfg(test)]
pub use notification_publisher::MockNotificationPublisher;
pub use notification_publisher::{
    FixtureNotificationPublisher, Notification, NotificationError, NotificationFeed,
    NotificationPublisher,
};
#[cfg(test)]
pub use object_storage::{MockObjectStorage, MockSignedObjectReader};
pub use object_storage::{ObjectStorage, ObjectStorageError, SignedObjectReader};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{FixturePasswordHasher, PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    FixturePaymentGateway, PayableLinkRequest, PaymentGateway, PaymentGatewayError,
};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::PaymentRepository;
#[cfg(test)]
pub use quote_command::MockQuoteCommand;
pub use quote_command::{QuoteCommand, QuoteSubmission};
#[cfg(test)]
pub use quote_query::MockQuoteQuery;
pub use quote_query::QuoteQuery;
#[cfg(test)]
pub use quote_repository::MockQuoteRepository;
pub use quote_repository::QuoteRepository;
pub use repository_error::{
    QUOTES_CASE_LAWYER_KEY, QUOTES_ONE_ACCEPTED_PER_CASE, RepositoryError, USERS_EMAIL_KEY,
};
#[cfg(test)]
pub use settlement_command::MockSettlementCommand;
pub use settlement_command::{AcceptanceResponse, SettlementCommand, SettlementReceipt};
pub use store_transaction::{StoreTransaction, TransactionalStore};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
#[cfg(test)]
pub use webhook_authenticator::MockWebhookAuthenticator;
pub use webhook_authenticator::{
    RejectingWebhookAuthenticator, WebhookAuthError, WebhookAuthenticator,
};

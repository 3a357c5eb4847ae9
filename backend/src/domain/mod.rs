//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed marketplace entities (accounts, cases,
//! quotes, payments and case files), the policies guarding them, and the
//! services that implement the driving ports. Adapters live in `inbound` and
//! `outbound` and only meet the domain through `ports`.
//!
//! Public surface:
//! - Error and ErrorCode: API error payload and its stable identifier.
//! - Case, Quote, Payment, CaseFile, User: aggregates persisted by adapters.
//! - Services: `AccountsService`, `CaseService`, `MarketplaceService`,
//!   `QuoteService`, `SettlementService` and `CaseFileService`.

pub mod access;
pub mod case;
pub mod case_file;
pub mod error;
pub mod ids;
pub mod pagination;
pub mod payment;
pub mod ports;
pub mod quote;
pub mod redaction;
pub mod trace_id;
pub mod user;

mod accounts_service;
mod case_file_service;
mod case_service;
mod marketplace_service;
mod quote_service;
pub(crate) mod service_support;
mod settlement_service;

pub use self::access::{Actor, CaseDetailAccess, authorize_file_download, case_detail_access};
pub use self::accounts_service::AccountsService;
pub use self::case::{Case, CaseDraft, CaseStatus, CaseSummary, CaseValidationError, OpenCaseFilter};
pub use self::case_file::{
    AllowedExtension, CaseFile, UploadPolicy, UploadRejection, storage_key, stored_file_name,
};
pub use self::case_file_service::CaseFileService;
pub use self::case_service::CaseService;
pub use self::error::{Error, ErrorCode};
pub use self::ids::{CaseFileId, CaseId, PaymentId, QuoteId, UserId};
pub use self::marketplace_service::MarketplaceService;
pub use self::pagination::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
pub use self::payment::{
    METADATA_CASE_ID, METADATA_PAYMENT_LINK_ID, METADATA_QUOTE_ID, Payment, PaymentConfirmation,
    PaymentLink, PaymentStatus, UnknownPaymentStatus,
};
pub use self::quote::{
    Quote, QuoteAlreadyAccepted, QuoteAmount, QuoteStatus, QuoteTerms, QuoteValidationError,
};
pub use self::quote_service::QuoteService;
pub use self::redaction::anonymize;
pub use self::settlement_service::{
    PAYMENT_COMPLETED_EVENT, SettlementConfig, SettlementPorts, SettlementService,
    payment_channel,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, LoginCredentials, PASSWORD_MIN_CHARS, Role, SignupDetails, SignupDraft, User,
    UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use docket::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

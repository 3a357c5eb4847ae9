//! Request and response bodies shared by the HTTP handlers.
//!
//! Domain entities stay free of serde/utoipa concerns; these types shape the
//! JSON contract and carry the OpenAPI schemas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{CaseFileGrant, ClientCaseDetail, MarketplaceCaseDetail};
use crate::domain::{Case, CaseSummary, Page, PageRequest, Quote, User};

/// Pagination query parameters shared by listing endpoints.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// One-based page number (default 1).
    pub page: Option<u32>,
    /// Items per page (default 10, capped at 100).
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// Listing envelope: `{ data, page, page_size, total, total_pages }`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>, convert: impl FnMut(U) -> T) -> Self {
        let total_pages = page.total_pages();
        let Page {
            items,
            page,
            page_size,
            total,
        } = page;
        Self {
            data: items.into_iter().map(convert).collect(),
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// Account as shown to its owner. The password hash never leaves the server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "client@example.com")]
    pub email: String,
    pub name: String,
    #[schema(example = "client")]
    pub role: String,
    pub jurisdiction: Option<String>,
    pub bar_number: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            email: user.email.as_str().to_owned(),
            name: user.name,
            role: user.role.as_str().to_owned(),
            jurisdiction: user.jurisdiction,
            bar_number: user.bar_number,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaseResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    #[schema(example = "open")]
    pub status: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl From<Case> for CaseResponse {
    fn from(case: Case) -> Self {
        Self {
            id: *case.id.as_uuid(),
            client_id: *case.client_id.as_uuid(),
            title: case.title,
            category: case.category,
            description: case.description,
            status: case.status.as_str().to_owned(),
            created_at: case.created_at,
            updated_at: case.updated_at,
        }
    }
}

/// A client's case with the number of quotes received.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaseSummaryResponse {
    #[serde(flatten)]
    pub case: CaseResponse,
    pub quote_count: u64,
}

impl From<CaseSummary> for CaseSummaryResponse {
    fn from(summary: CaseSummary) -> Self {
        Self {
            case: summary.case.into(),
            quote_count: summary.quote_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub case_id: Uuid,
    pub lawyer_id: Uuid,
    /// Exact decimal amount in major units.
    #[schema(example = "1234.56")]
    pub amount: String,
    pub expected_days: u32,
    pub note: String,
    #[schema(example = "proposed")]
    pub status: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            id: *quote.id.as_uuid(),
            case_id: *quote.case_id.as_uuid(),
            lawyer_id: *quote.lawyer_id.as_uuid(),
            amount: quote.amount.to_string(),
            expected_days: quote.expected_days,
            note: quote.note,
            status: quote.status.as_str().to_owned(),
            created_at: quote.created_at,
            updated_at: quote.updated_at,
        }
    }
}

/// `{"quote": null}` when the lawyer has not quoted yet.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MyQuoteResponse {
    pub quote: Option<QuoteResponse>,
}

/// Case file metadata with a time-limited download link.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaseFileResponse {
    pub id: Uuid,
    pub case_id: Uuid,
    pub file_name: String,
    pub file_size: u64,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    pub download_url: Option<String>,
    pub expires_in_seconds: Option<u64>,
}

impl From<crate::domain::CaseFile> for CaseFileResponse {
    fn from(file: crate::domain::CaseFile) -> Self {
        Self {
            id: *file.id.as_uuid(),
            case_id: *file.case_id.as_uuid(),
            file_name: file.file_name,
            file_size: file.file_size,
            mime_type: file.mime_type,
            created_at: file.created_at,
            download_url: None,
            expires_in_seconds: None,
        }
    }
}

impl From<CaseFileGrant> for CaseFileResponse {
    fn from(granted: CaseFileGrant) -> Self {
        Self {
            download_url: Some(granted.grant.download_url),
            expires_in_seconds: Some(granted.grant.expires_in_seconds),
            ..granted.file.into()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientCaseDetailResponse {
    pub case: CaseResponse,
    pub quotes: Vec<QuoteResponse>,
    pub files: Vec<CaseFileResponse>,
}

impl From<ClientCaseDetail> for ClientCaseDetailResponse {
    fn from(detail: ClientCaseDetail) -> Self {
        Self {
            case: detail.case.into(),
            quotes: detail.quotes.into_iter().map(Into::into).collect(),
            files: detail.files.into_iter().map(Into::into).collect(),
        }
    }
}

/// Marketplace view of a case; `redacted` marks an anonymized description.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarketplaceCaseDetailResponse {
    pub case: CaseResponse,
    pub redacted: bool,
    pub has_submitted: bool,
    pub files: Vec<CaseFileResponse>,
}

impl From<MarketplaceCaseDetail> for MarketplaceCaseDetailResponse {
    fn from(detail: MarketplaceCaseDetail) -> Self {
        Self {
            case: detail.case.into(),
            redacted: detail.access != crate::domain::CaseDetailAccess::Full,
            has_submitted: detail.has_submitted,
            files: detail.files.into_iter().map(Into::into).collect(),
        }
    }
}

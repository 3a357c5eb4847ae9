//! Driving port for a client's view of their own cases.

use async_trait::async_trait;

use crate::domain::{Actor, Case, CaseId, CaseSummary, Error, Page, PageRequest, Quote, UserId};

use super::CaseFileGrant;

/// Everything a case owner sees on the detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCaseDetail {
    pub case: Case,
    pub quotes: Vec<Quote>,
    pub files: Vec<CaseFileGrant>,
}

/// Read-side case use-cases for clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseQuery: Send + Sync {
    /// Cases owned by `client_id` with quote counts.
    async fn list_client_cases(
        &self,
        client_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<CaseSummary>, Error>;

    /// Detail view for the owning client.
    ///
    /// # Errors
    ///
    /// `not_found` for an unknown case, `forbidden` for anyone but the owner.
    async fn client_case_detail(
        &self,
        actor: &Actor,
        case_id: &CaseId,
    ) -> Result<ClientCaseDetail, Error>;
}

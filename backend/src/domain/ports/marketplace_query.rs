//! Driving port for the lawyer-facing marketplace.

use async_trait::async_trait;

use crate::domain::{Actor, Case, CaseDetailAccess, CaseId, Error, OpenCaseFilter, Page, PageRequest};

use super::CaseFileGrant;

/// A case as shown to a lawyer.
///
/// `case.description` is already anonymized unless `access` is
/// [`CaseDetailAccess::Full`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceCaseDetail {
    pub case: Case,
    pub access: CaseDetailAccess,
    /// Whether the caller has a quote on this case.
    pub has_submitted: bool,
    /// Empty unless `access` is full.
    pub files: Vec<CaseFileGrant>,
}

/// Marketplace browsing use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceQuery: Send + Sync {
    /// Open cases with anonymized descriptions.
    async fn list_open_cases(
        &self,
        filter: OpenCaseFilter,
        page: PageRequest,
    ) -> Result<Page<Case>, Error>;

    /// A single case, revealed as far as the caller is entitled.
    async fn case_detail(
        &self,
        actor: &Actor,
        case_id: &CaseId,
    ) -> Result<MarketplaceCaseDetail, Error>;
}

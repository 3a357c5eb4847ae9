//! Port abstraction for case persistence.
use async_trait::async_trait;

use crate::domain::{Case, CaseId, CaseSummary, OpenCaseFilter, PageRequest, UserId};

use super::RepositoryError;

/// Case storage outside settlement transactions.
///
/// Status changes are never written through this port; see
/// [`super::StoreTransaction::engage_case`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Insert a newly opened case.
    async fn create(&self, case: &Case) -> Result<(), RepositoryError>;

    /// Fetch a case by identifier.
    async fn find_by_id(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError>;

    /// A client's cases, newest first, with quote counts and the total.
    async fn list_for_client(
        &self,
        client_id: &UserId,
        page: PageRequest,
    ) -> Result<(Vec<CaseSummary>, u64), RepositoryError>;

    /// Open cases matching `filter`, newest first, with the total.
    async fn list_open(
        &self,
        filter: &OpenCaseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Case>, u64), RepositoryError>;
}

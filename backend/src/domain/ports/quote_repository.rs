//! Port abstraction for quote persistence.
use async_trait::async_trait;

use crate::domain::{CaseId, PageRequest, Quote, QuoteId, QuoteStatus, UserId};

use super::RepositoryError;

/// Quote storage outside settlement transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Insert a proposed quote.
    ///
    /// A second quote for the same case and lawyer fails with
    /// [`RepositoryError::UniqueViolation`].
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError>;

    /// Persist revised terms and set the status back to proposed.
    ///
    /// One conditional write: it applies only while the stored quote is
    /// proposed or rejected and its case is still open. Returns whether a
    /// row changed.
    async fn update_terms(&self, quote: &Quote) -> Result<bool, RepositoryError>;

    /// Fetch a quote by identifier.
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;

    /// The quote a lawyer holds on a case, if any.
    async fn find_by_case_and_lawyer(
        &self,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Option<Quote>, RepositoryError>;

    /// The accepted quote on a case, if settlement has happened.
    async fn find_accepted_for_case(
        &self,
        case_id: &CaseId,
    ) -> Result<Option<Quote>, RepositoryError>;

    /// All quotes on a case, oldest first.
    async fn list_for_case(&self, case_id: &CaseId) -> Result<Vec<Quote>, RepositoryError>;

    /// A lawyer's quotes, newest first, optionally filtered by status.
    async fn list_for_lawyer(
        &self,
        lawyer_id: &UserId,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Quote>, u64), RepositoryError>;
}

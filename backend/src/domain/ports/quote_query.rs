//! Driving port for reading quotes.

use async_trait::async_trait;

use crate::domain::{CaseId, Error, Page, PageRequest, Quote, QuoteStatus, UserId};

/// Quote lookups available to lawyers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteQuery: Send + Sync {
    /// The lawyer's quote on a case. `None` means nothing was submitted.
    async fn quote_by_case_and_lawyer(
        &self,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Option<Quote>, Error>;

    /// The lawyer's quotes across all cases.
    async fn list_lawyer_quotes(
        &self,
        lawyer_id: &UserId,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> Result<Page<Quote>, Error>;
}

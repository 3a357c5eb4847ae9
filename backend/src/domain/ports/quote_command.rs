//! Driving port for quote submission and revision.

use async_trait::async_trait;

use crate::domain::{CaseId, Error, Quote, UserId};

/// Raw quote terms as supplied by a lawyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSubmission {
    pub case_id: CaseId,
    pub lawyer_id: UserId,
    /// Decimal string in major units, e.g. `"1234.56"`.
    pub amount: String,
    pub expected_days: i64,
    pub note: String,
}

/// Quote mutations available to lawyers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteCommand: Send + Sync {
    /// Create the lawyer's quote on an open case.
    ///
    /// # Errors
    ///
    /// `not_found` for an unknown case, `invalid_state` if the case is not
    /// open, `conflict` if the lawyer already quoted, `invalid_request` for
    /// bad terms.
    async fn submit_quote(&self, submission: QuoteSubmission) -> Result<Quote, Error>;

    /// Revise the lawyer's existing quote.
    ///
    /// # Errors
    ///
    /// `not_found` if the case or quote is missing, `invalid_state` if the
    /// case is not open or the quote is accepted, `invalid_request` for bad
    /// terms.
    async fn update_quote(&self, submission: QuoteSubmission) -> Result<Quote, Error>;
}

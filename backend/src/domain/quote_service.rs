//! Quote lifecycle service.
//!
//! Enforces one quote per lawyer per case, keeps accepted quotes immutable,
//! and lets rejected quotes re-enter the pool while their case is open.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CaseRepository, QuoteCommand, QuoteQuery, QuoteRepository, QuoteSubmission, RepositoryError,
};
use crate::domain::service_support::{map_repository_error, require_case};
use crate::domain::{
    CaseId, Error, Page, PageRequest, Quote, QuoteStatus, QuoteTerms, UserId,
};

const DUPLICATE_QUOTE: &str =
    "you have already submitted a quote for this case; update it instead";

fn parse_terms(submission: &QuoteSubmission) -> Result<QuoteTerms, Error> {
    QuoteTerms::new(
        &submission.amount,
        submission.expected_days,
        &submission.note,
    )
    .map_err(|err| Error::invalid_request(err.to_string()))
}

/// Quote service implementing [`QuoteCommand`] and [`QuoteQuery`].
#[derive(Clone)]
pub struct QuoteService<C, Q> {
    cases: Arc<C>,
    quotes: Arc<Q>,
    clock: Arc<dyn Clock>,
}

impl<C, Q> QuoteService<C, Q> {
    /// Create the service.
    pub fn new(cases: Arc<C>, quotes: Arc<Q>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cases,
            quotes,
            clock,
        }
    }
}

impl<C, Q> QuoteService<C, Q>
where
    C: CaseRepository,
    Q: QuoteRepository,
{
    async fn require_open_case(&self, case_id: &CaseId) -> Result<(), Error> {
        let case = require_case(self.cases.as_ref(), case_id).await?;
        if !case.is_open() {
            return Err(Error::invalid_state("case is not open for quotes"));
        }
        Ok(())
    }

    async fn existing_quote(
        &self,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Option<Quote>, Error> {
        self.quotes
            .find_by_case_and_lawyer(case_id, lawyer_id)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<C, Q> QuoteCommand for QuoteService<C, Q>
where
    C: CaseRepository,
    Q: QuoteRepository,
{
    async fn submit_quote(&self, submission: QuoteSubmission) -> Result<Quote, Error> {
        self.require_open_case(&submission.case_id).await?;
        if self
            .existing_quote(&submission.case_id, &submission.lawyer_id)
            .await?
            .is_some()
        {
            return Err(Error::conflict(DUPLICATE_QUOTE));
        }

        let terms = parse_terms(&submission)?;
        let quote = Quote::propose(
            submission.case_id,
            submission.lawyer_id,
            terms,
            self.clock.utc(),
        );
        self.quotes.create(&quote).await.map_err(|err| match err {
            RepositoryError::UniqueViolation { .. } => Error::conflict(DUPLICATE_QUOTE),
            other => map_repository_error(other),
        })?;
        info!(quote_id = %quote.id, case_id = %quote.case_id, "quote submitted");
        Ok(quote)
    }

    async fn update_quote(&self, submission: QuoteSubmission) -> Result<Quote, Error> {
        self.require_open_case(&submission.case_id).await?;
        let mut quote = self
            .existing_quote(&submission.case_id, &submission.lawyer_id)
            .await?
            .ok_or_else(|| Error::not_found("quote not found; submit a quote first"))?;
        if quote.status == QuoteStatus::Accepted {
            return Err(Error::invalid_state("quote already accepted, cannot update"));
        }

        let terms = parse_terms(&submission)?;
        quote
            .revise(terms, self.clock.utc())
            .map_err(|err| Error::invalid_state(err.to_string()))?;
        let updated = self
            .quotes
            .update_terms(&quote)
            .await
            .map_err(map_repository_error)?;
        if !updated {
            return Err(Error::invalid_state(
                "quote can no longer be updated; the case has been engaged",
            ));
        }
        info!(quote_id = %quote.id, "quote revised");
        Ok(quote)
    }
}

#[async_trait]
impl<C, Q> QuoteQuery for QuoteService<C, Q>
where
    C: CaseRepository,
    Q: QuoteRepository,
{
    async fn quote_by_case_and_lawyer(
        &self,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Option<Quote>, Error> {
        self.existing_quote(case_id, lawyer_id).await
    }

    async fn list_lawyer_quotes(
        &self,
        lawyer_id: &UserId,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> Result<Page<Quote>, Error> {
        let (items, total) = self
            .quotes
            .list_for_lawyer(lawyer_id, status, page)
            .await
            .map_err(map_repository_error)?;
        Ok(Page::new(items, page, total))
    }
}

#[cfg(test)]
#[path = "quote_service_tests.rs"]
mod tests;

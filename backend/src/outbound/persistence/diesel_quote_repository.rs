//! PostgreSQL-backed `QuoteRepository` implementation using Diesel ORM.
//!
//! Uniqueness of `(case_id, lawyer_id)` and of the accepted quote per case is
//! enforced by the schema; violations surface as
//! `RepositoryError::UniqueViolation` carrying the constraint name.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{QuoteRepository, RepositoryError};
use crate::domain::{CaseId, CaseStatus, PageRequest, Quote, QuoteId, QuoteStatus, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{QuoteRow, QuoteTermsUpdate, convert_rows};
use super::paging::{page_bounds, row_count};
use super::pool::DbPool;
use super::schema::{cases, quotes};

/// Stored statuses a revision may overwrite; the row always ends `proposed`.
const REVISABLE: [&str; 2] = [
    QuoteStatus::Proposed.as_str(),
    QuoteStatus::Rejected.as_str(),
];

/// Diesel-backed implementation of the quote repository port.
#[derive(Clone)]
pub struct DieselQuoteRepository {
    pool: DbPool,
}

impl DieselQuoteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn lawyer_quotes(lawyer_id: &UserId, status: Option<QuoteStatus>) -> quotes::BoxedQuery<'static, Pg> {
    let mut query = quotes::table
        .filter(quotes::lawyer_id.eq(*lawyer_id.as_uuid()))
        .into_boxed();
    if let Some(status) = status {
        query = query.filter(quotes::status.eq(status.as_str()));
    }
    query
}

#[async_trait]
impl QuoteRepository for DieselQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let row = QuoteRow::try_from(quote)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(quotes::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_terms(&self, quote: &Quote) -> Result<bool, RepositoryError> {
        let changeset = QuoteTermsUpdate::from_quote(quote)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let open_cases = cases::table
            .filter(cases::status.eq(CaseStatus::Open.as_str()))
            .select(cases::id);
        let updated = diesel::update(
            quotes::table
                .filter(quotes::id.eq(*quote.id.as_uuid()))
                .filter(quotes::status.eq_any(REVISABLE))
                .filter(quotes::case_id.eq_any(open_cases)),
        )
        .set(&changeset)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        quotes::table
            .filter(quotes::id.eq(*id.as_uuid()))
            .select(QuoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Quote::try_from)
            .transpose()
    }

    async fn find_by_case_and_lawyer(
        &self,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Option<Quote>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        quotes::table
            .filter(quotes::case_id.eq(*case_id.as_uuid()))
            .filter(quotes::lawyer_id.eq(*lawyer_id.as_uuid()))
            .select(QuoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Quote::try_from)
            .transpose()
    }

    async fn find_accepted_for_case(
        &self,
        case_id: &CaseId,
    ) -> Result<Option<Quote>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        quotes::table
            .filter(quotes::case_id.eq(*case_id.as_uuid()))
            .filter(quotes::status.eq(QuoteStatus::Accepted.as_str()))
            .select(QuoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Quote::try_from)
            .transpose()
    }

    async fn list_for_case(&self, case_id: &CaseId) -> Result<Vec<Quote>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<QuoteRow> = quotes::table
            .filter(quotes::case_id.eq(*case_id.as_uuid()))
            .select(QuoteRow::as_select())
            .order((quotes::created_at.asc(), quotes::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn list_for_lawyer(
        &self,
        lawyer_id: &UserId,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Quote>, u64), RepositoryError> {
        let (limit, offset) = page_bounds(page);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = lawyer_quotes(lawyer_id, status)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<QuoteRow> = lawyer_quotes(lawyer_id, status)
            .select(QuoteRow::as_select())
            .order((quotes::created_at.desc(), quotes::id))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok((convert_rows(rows)?, row_count(total)?))
    }
}

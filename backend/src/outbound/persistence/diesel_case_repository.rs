//! PostgreSQL-backed `CaseRepository` implementation using Diesel ORM.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{CaseRepository, RepositoryError};
use crate::domain::{Case, CaseId, CaseStatus, CaseSummary, OpenCaseFilter, PageRequest, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CaseRow, convert_rows};
use super::paging::{page_bounds, row_count};
use super::pool::DbPool;
use super::schema::{cases, quotes};

/// Diesel-backed implementation of the case repository port.
#[derive(Clone)]
pub struct DieselCaseRepository {
    pool: DbPool,
}

impl DieselCaseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn open_cases(filter: &OpenCaseFilter) -> cases::BoxedQuery<'_, Pg> {
    let mut query = cases::table
        .filter(cases::status.eq(CaseStatus::Open.as_str()))
        .into_boxed();
    if let Some(category) = filter.category.as_deref() {
        query = query.filter(cases::category.eq(category));
    }
    if let Some(since) = filter.created_since {
        query = query.filter(cases::created_at.ge(since));
    }
    query
}

#[async_trait]
impl CaseRepository for DieselCaseRepository {
    async fn create(&self, case: &Case) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(cases::table)
            .values(&CaseRow::from(case))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        cases::table
            .filter(cases::id.eq(*id.as_uuid()))
            .select(CaseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Case::try_from)
            .transpose()
    }

    async fn list_for_client(
        &self,
        client_id: &UserId,
        page: PageRequest,
    ) -> Result<(Vec<CaseSummary>, u64), RepositoryError> {
        let (limit, offset) = page_bounds(page);
        let client = *client_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = cases::table
            .filter(cases::client_id.eq(client))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<CaseRow> = cases::table
            .filter(cases::client_id.eq(client))
            .select(CaseRow::as_select())
            .order((cases::created_at.desc(), cases::id))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let counts: HashMap<Uuid, i64> = quotes::table
            .filter(quotes::case_id.eq_any(ids))
            .group_by(quotes::case_id)
            .select((quotes::case_id, count_star()))
            .load::<(Uuid, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let quote_count = row_count(counts.get(&row.id).copied().unwrap_or(0))?;
            summaries.push(CaseSummary {
                case: Case::try_from(row)?,
                quote_count,
            });
        }
        Ok((summaries, row_count(total)?))
    }

    async fn list_open(
        &self,
        filter: &OpenCaseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Case>, u64), RepositoryError> {
        let (limit, offset) = page_bounds(page);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = open_cases(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<CaseRow> = open_cases(filter)
            .select(CaseRow::as_select())
            .order((cases::created_at.desc(), cases::id))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok((convert_rows(rows)?, row_count(total)?))
    }
}

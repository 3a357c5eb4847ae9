//! PostgreSQL-backed `CaseFileRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CaseFileRepository, RepositoryError};
use crate::domain::{CaseFile, CaseFileId, CaseId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CaseFileRow, convert_rows};
use super::paging::row_count;
use super::pool::DbPool;
use super::schema::case_files;

/// Diesel-backed implementation of the case file repository port.
#[derive(Clone)]
pub struct DieselCaseFileRepository {
    pool: DbPool,
}

impl DieselCaseFileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseFileRepository for DieselCaseFileRepository {
    async fn create(&self, file: &CaseFile) -> Result<(), RepositoryError> {
        let row = CaseFileRow::try_from(file)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(case_files::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &CaseFileId) -> Result<Option<CaseFile>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        case_files::table
            .filter(case_files::id.eq(*id.as_uuid()))
            .select(CaseFileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(CaseFile::try_from)
            .transpose()
    }

    async fn count_for_case(&self, case_id: &CaseId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = case_files::table
            .filter(case_files::case_id.eq(*case_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_count(count)
    }

    async fn list_for_case(&self, case_id: &CaseId) -> Result<Vec<CaseFile>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CaseFileRow> = case_files::table
            .filter(case_files::case_id.eq(*case_id.as_uuid()))
            .select(CaseFileRow::as_select())
            .order((case_files::created_at.asc(), case_files::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }
}

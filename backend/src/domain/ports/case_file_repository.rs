//! Port abstraction for case file metadata.
use async_trait::async_trait;

use crate::domain::{CaseFile, CaseFileId, CaseId};

use super::RepositoryError;

/// Metadata storage for uploaded case files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseFileRepository: Send + Sync {
    async fn create(&self, file: &CaseFile) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &CaseFileId) -> Result<Option<CaseFile>, RepositoryError>;

    async fn count_for_case(&self, case_id: &CaseId) -> Result<u64, RepositoryError>;

    /// Files on a case, oldest first.
    async fn list_for_case(&self, case_id: &CaseId) -> Result<Vec<CaseFile>, RepositoryError>;
}

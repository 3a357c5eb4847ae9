//! Internal helpers shared by the marketplace services.

use std::time::Duration;

use crate::domain::ports::{
    CaseFileGrant, CaseFileRepository, CaseRepository, DOWNLOAD_TTL_SECONDS, DownloadGrant,
    ObjectStorage, ObjectStorageError, QuoteRepository, RepositoryError,
};
use crate::domain::{Case, CaseFile, CaseId, Error, Quote, QuoteId};

pub(crate) fn map_repository_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            Error::service_unavailable(format!("repository unavailable: {message}"))
        }
        RepositoryError::Query { message } => {
            Error::internal(format!("repository error: {message}"))
        }
        RepositoryError::UniqueViolation { constraint } => {
            Error::conflict(format!("record already exists: {constraint}"))
        }
    }
}

pub(crate) fn map_storage_error(error: ObjectStorageError) -> Error {
    match error {
        ObjectStorageError::NotFound { key } => Error::not_found(format!("object {key} is missing")),
        other => Error::internal(format!("object storage error: {other}")),
    }
}

pub(crate) async fn require_case<C>(cases: &C, case_id: &CaseId) -> Result<Case, Error>
where
    C: CaseRepository + ?Sized,
{
    cases
        .find_by_id(case_id)
        .await
        .map_err(map_repository_error)?
        .ok_or_else(|| Error::not_found("case not found"))
}

pub(crate) async fn require_quote<Q>(quotes: &Q, quote_id: &QuoteId) -> Result<Quote, Error>
where
    Q: QuoteRepository + ?Sized,
{
    quotes
        .find_by_id(quote_id)
        .await
        .map_err(map_repository_error)?
        .ok_or_else(|| Error::not_found("quote not found"))
}

pub(crate) async fn download_grant<S>(storage: &S, file: &CaseFile) -> Result<DownloadGrant, Error>
where
    S: ObjectStorage + ?Sized,
{
    let download_url = storage
        .presign_download(
            &file.storage_path,
            Duration::from_secs(DOWNLOAD_TTL_SECONDS),
        )
        .await
        .map_err(map_storage_error)?;
    Ok(DownloadGrant {
        download_url,
        expires_in_seconds: DOWNLOAD_TTL_SECONDS,
    })
}

/// Every file on a case paired with a fresh download grant.
pub(crate) async fn file_grants<F, S>(
    files: &F,
    storage: &S,
    case_id: &CaseId,
) -> Result<Vec<CaseFileGrant>, Error>
where
    F: CaseFileRepository + ?Sized,
    S: ObjectStorage + ?Sized,
{
    let stored = files
        .list_for_case(case_id)
        .await
        .map_err(map_repository_error)?;
    let mut grants = Vec::with_capacity(stored.len());
    for file in stored {
        let grant = download_grant(storage, &file).await?;
        grants.push(CaseFileGrant { file, grant });
    }
    Ok(grants)
}

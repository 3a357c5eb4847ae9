//! Case file uploads and download grants.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CaseFileCommand, CaseFileRepository, CaseFileUpload, CaseRepository, DownloadGrant,
    ObjectStorage, QuoteRepository,
};
use crate::domain::service_support::{
    download_grant, map_repository_error, map_storage_error, require_case,
};
use crate::domain::{
    Actor, CaseFile, CaseFileId, Error, UploadPolicy, UploadRejection, authorize_file_download,
    storage_key, stored_file_name,
};

fn map_rejection(rejection: UploadRejection) -> Error {
    match rejection {
        UploadRejection::TooManyFiles { .. } => Error::quota_exceeded(rejection.to_string()),
        other => Error::invalid_request(other.to_string()),
    }
}

/// Case file service implementing [`CaseFileCommand`].
#[derive(Clone)]
pub struct CaseFileService<C, Q, F> {
    cases: Arc<C>,
    quotes: Arc<Q>,
    files: Arc<F>,
    storage: Arc<dyn ObjectStorage>,
    policy: UploadPolicy,
    clock: Arc<dyn Clock>,
}

impl<C, Q, F> CaseFileService<C, Q, F> {
    /// Create the service.
    pub fn new(
        cases: Arc<C>,
        quotes: Arc<Q>,
        files: Arc<F>,
        storage: Arc<dyn ObjectStorage>,
        policy: UploadPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cases,
            quotes,
            files,
            storage,
            policy,
            clock,
        }
    }
}

#[async_trait]
impl<C, Q, F> CaseFileCommand for CaseFileService<C, Q, F>
where
    C: CaseRepository,
    Q: QuoteRepository,
    F: CaseFileRepository,
{
    async fn upload(&self, actor: &Actor, upload: CaseFileUpload) -> Result<CaseFile, Error> {
        let case = require_case(self.cases.as_ref(), &upload.case_id).await?;
        if !case.is_owned_by(&actor.user_id) {
            return Err(Error::forbidden(
                "you can only upload files to your own cases",
            ));
        }

        let size = upload.bytes.len() as u64;
        let allowed = self
            .policy
            .extension_for(&upload.file_name)
            .map_err(map_rejection)?;
        self.policy.check_size(size).map_err(map_rejection)?;
        let existing = self
            .files
            .count_for_case(&case.id)
            .await
            .map_err(map_repository_error)?;
        self.policy.check_count(existing).map_err(map_rejection)?;

        let now = self.clock.utc();
        let stored_name = stored_file_name(rand::random(), now, allowed.extension);
        let key = storage_key(&case.id, &stored_name);
        let mime_type = upload
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(allowed.mime_type)
            .to_owned();

        self.storage
            .put_object(&key, upload.bytes, &mime_type)
            .await
            .map_err(map_storage_error)?;

        let file = CaseFile {
            id: CaseFileId::random(),
            case_id: case.id,
            file_name: upload.file_name.trim().to_owned(),
            storage_path: key,
            file_size: size,
            mime_type,
            created_at: now,
        };
        self.files
            .create(&file)
            .await
            .map_err(map_repository_error)?;
        info!(case_id = %case.id, file_id = %file.id, size, "case file stored");
        Ok(file)
    }

    async fn download_grant(
        &self,
        actor: &Actor,
        file_id: &CaseFileId,
    ) -> Result<DownloadGrant, Error> {
        let file = self
            .files
            .find_by_id(file_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("file not found"))?;
        let case = require_case(self.cases.as_ref(), &file.case_id).await?;
        let accepted = self
            .quotes
            .find_accepted_for_case(&case.id)
            .await
            .map_err(map_repository_error)?;
        authorize_file_download(actor, &case, accepted.as_ref())?;
        download_grant(self.storage.as_ref(), &file).await
    }
}

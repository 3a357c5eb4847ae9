//! Driving port for uploading and downloading case files.

use async_trait::async_trait;

use crate::domain::{Actor, CaseFile, CaseFileId, CaseId, Error};

/// Seconds a download grant stays valid.
pub const DOWNLOAD_TTL_SECONDS: u64 = 3600;

/// A raw upload from the case owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFileUpload {
    pub case_id: CaseId,
    /// Display name supplied by the uploader.
    pub file_name: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Time-limited download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadGrant {
    pub download_url: String,
    pub expires_in_seconds: u64,
}

/// A file with a ready-made download grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFileGrant {
    pub file: CaseFile,
    pub grant: DownloadGrant,
}

/// Case file use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseFileCommand: Send + Sync {
    /// Store a file on the actor's case.
    ///
    /// # Errors
    ///
    /// `forbidden` unless the actor owns the case, `invalid_request` for a
    /// disallowed type or size, `quota_exceeded` once the case is full.
    async fn upload(&self, actor: &Actor, upload: CaseFileUpload) -> Result<CaseFile, Error>;

    /// Issue a download URL if the actor may read the file.
    async fn download_grant(
        &self,
        actor: &Actor,
        file_id: &CaseFileId,
    ) -> Result<DownloadGrant, Error>;
}

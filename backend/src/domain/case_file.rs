//! Files attached to cases and the policy guarding uploads.

use std::path::Path;

use chrono::{DateTime, Utc};

use super::{CaseFileId, CaseId};

/// Metadata for a stored case document.
///
/// `file_name` is the display name supplied by the uploader; the object
/// itself lives under `storage_path`, which never contains that name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFile {
    pub id: CaseFileId,
    pub case_id: CaseId,
    pub file_name: String,
    pub storage_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// Reasons an upload is refused before any bytes are stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("file name must not be empty")]
    MissingName,
    #[error("only {allowed} files are allowed")]
    DisallowedExtension { allowed: String },
    #[error("file size exceeds the {max_bytes} byte limit")]
    TooLarge { max_bytes: u64 },
    #[error("file must not be empty")]
    Empty,
    #[error("maximum {max_files} files allowed per case")]
    TooManyFiles { max_files: u64 },
}

/// An extension permitted by the upload policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedExtension {
    /// Lower-case extension including the dot, e.g. `.pdf`.
    pub extension: &'static str,
    /// MIME type assumed when the client does not declare one.
    pub mime_type: &'static str,
}

/// Extension, size and per-case count limits for uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub allowed: Vec<AllowedExtension>,
    pub max_bytes: u64,
    pub max_files_per_case: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed: vec![
                AllowedExtension {
                    extension: ".pdf",
                    mime_type: "application/pdf",
                },
                AllowedExtension {
                    extension: ".png",
                    mime_type: "image/png",
                },
            ],
            max_bytes: 10 * 1024 * 1024,
            max_files_per_case: 10,
        }
    }
}

impl UploadPolicy {
    /// Check an upload against the policy.
    ///
    /// Checks run extension first, then size, then the per-case count, so a
    /// disallowed file never costs a count lookup at the caller.
    ///
    /// # Examples
    /// ```
    /// use docket::domain::{UploadPolicy, UploadRejection};
    ///
    /// let policy = UploadPolicy::default();
    /// let accepted = policy.check("Brief.PDF", 1024, 0).expect("pdf accepted");
    /// assert_eq!(accepted.mime_type, "application/pdf");
    /// assert!(matches!(
    ///     policy.check("notes.docx", 10, 0),
    ///     Err(UploadRejection::DisallowedExtension { .. })
    /// ));
    /// ```
    pub fn check(
        &self,
        file_name: &str,
        size: u64,
        existing_files: u64,
    ) -> Result<AllowedExtension, UploadRejection> {
        let allowed = self.extension_for(file_name)?;
        self.check_size(size)?;
        self.check_count(existing_files)?;
        Ok(allowed)
    }

    /// Resolve the allowed extension for `file_name`.
    pub fn extension_for(&self, file_name: &str) -> Result<AllowedExtension, UploadRejection> {
        let trimmed = file_name.trim();
        if trimmed.is_empty() {
            return Err(UploadRejection::MissingName);
        }
        let extension = Path::new(trimmed)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()));
        extension
            .and_then(|ext| self.allowed.iter().copied().find(|a| a.extension == ext))
            .ok_or_else(|| UploadRejection::DisallowedExtension {
                allowed: self
                    .allowed
                    .iter()
                    .map(|a| a.extension)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Enforce the size cap.
    pub fn check_size(&self, size: u64) -> Result<(), UploadRejection> {
        if size == 0 {
            return Err(UploadRejection::Empty);
        }
        if size > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Enforce the per-case file limit.
    pub fn check_count(&self, existing_files: u64) -> Result<(), UploadRejection> {
        if existing_files >= self.max_files_per_case {
            return Err(UploadRejection::TooManyFiles {
                max_files: self.max_files_per_case,
            });
        }
        Ok(())
    }
}

/// Randomised object name: `{32 hex}_{unix seconds}{ext}`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use docket::domain::stored_file_name;
///
/// let at = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid time");
/// let name = stored_file_name([0xab; 16], at, ".pdf");
/// assert_eq!(name, format!("{}_1700000000.pdf", "ab".repeat(16)));
/// ```
#[must_use]
pub fn stored_file_name(random: [u8; 16], now: DateTime<Utc>, extension: &str) -> String {
    format!("{}_{}{extension}", hex::encode(random), now.timestamp())
}

/// Object-storage key for a stored file.
#[must_use]
pub fn storage_key(case_id: &CaseId, stored_name: &str) -> String {
    format!("cases/{case_id}/{stored_name}")
}

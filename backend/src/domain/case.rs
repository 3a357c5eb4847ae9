//! Legal cases posted by clients.
//!
//! A case starts `open` and becomes `engaged` exactly once, when a payment for
//! one of its quotes settles. Only the settlement engine moves a case out of
//! `open`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CaseId, UserId};

/// Validation failures when drafting a case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaseValidationError {
    #[error("{field} must not be empty")]
    BlankField { field: &'static str },
    #[error("unknown case status: {0}")]
    UnknownStatus(String),
}

/// Lifecycle state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Accepting quotes.
    Open,
    /// A quote has been paid for; the winning lawyer is engaged.
    Engaged,
}

impl CaseStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Engaged => "engaged",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = CaseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "engaged" => Ok(Self::Engaged),
            other => Err(CaseValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A client's legal matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub id: CaseId,
    pub client_id: UserId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// Open a new case from a validated draft.
    #[must_use]
    pub fn open(client_id: UserId, draft: CaseDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: CaseId::random(),
            client_id,
            title: draft.title,
            category: draft.category,
            description: draft.description,
            status: CaseStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == CaseStatus::Open
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.client_id == user_id
    }
}

/// Validated fields for a new case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDraft {
    title: String,
    category: String,
    description: String,
}

impl CaseDraft {
    /// Trim and validate the client-supplied fields.
    ///
    /// # Examples
    /// ```
    /// use docket::domain::CaseDraft;
    ///
    /// let draft = CaseDraft::new(" Lease dispute ", "property", "Landlord kept deposit")
    ///     .expect("valid draft");
    /// assert_eq!(draft.title(), "Lease dispute");
    /// assert!(CaseDraft::new("", "property", "x").is_err());
    /// ```
    pub fn new(
        title: &str,
        category: &str,
        description: &str,
    ) -> Result<Self, CaseValidationError> {
        Ok(Self {
            title: required("title", title)?,
            category: required("category", category)?,
            description: required("description", description)?,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

fn required(field: &'static str, value: &str) -> Result<String, CaseValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CaseValidationError::BlankField { field });
    }
    Ok(trimmed.to_owned())
}

/// A case together with the number of quotes lawyers have submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSummary {
    pub case: Case,
    pub quote_count: u64,
}

/// Marketplace filter over open cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenCaseFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Only cases created at or after this instant.
    pub created_since: Option<DateTime<Utc>>,
}

impl OpenCaseFilter {
    /// Whether `case` satisfies the filter. Closed cases never match.
    #[must_use]
    pub fn matches(&self, case: &Case) -> bool {
        case.is_open()
            && self
                .category
                .as_deref()
                .is_none_or(|category| case.category == category)
            && self
                .created_since
                .is_none_or(|since| case.created_at >= since)
    }
}

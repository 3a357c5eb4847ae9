//! Driving port for client case creation.

use async_trait::async_trait;

use crate::domain::{Case, CaseDraft, Error, UserId};

/// Case mutations available to clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseCommand: Send + Sync {
    /// Open a new case owned by `client_id`.
    async fn create_case(&self, client_id: &UserId, draft: CaseDraft) -> Result<Case, Error>;
}

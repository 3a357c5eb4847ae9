//! Scoped transactions over cases, quotes and payments.
//!
//! Every settlement mutation goes through a [`StoreTransaction`] so the
//! changes commit together or not at all. Status reads inside a transaction
//! lock the row in SQL adapters; the in-memory adapter serialises whole
//! transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CaseId, CaseStatus, Payment, PaymentId, QuoteId, QuoteStatus};

use super::RepositoryError;

/// Opens transactions.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Begin a new transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepositoryError>;
}

/// A live transaction.
///
/// Conditional mutations return `false` when their precondition no longer
/// holds, letting callers abort instead of overwriting a concurrent change.
/// Dropping a handle without calling [`commit`](Self::commit) discards its
/// changes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Current status of a quote, or `None` if it does not exist.
    async fn quote_status(&mut self, id: &QuoteId) -> Result<Option<QuoteStatus>, RepositoryError>;

    /// Current status of a case, or `None` if it does not exist.
    async fn case_status(&mut self, id: &CaseId) -> Result<Option<CaseStatus>, RepositoryError>;

    /// Insert a payment attempt.
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), RepositoryError>;

    /// Move a quote from `proposed` to `accepted`.
    async fn accept_quote(
        &mut self,
        id: &QuoteId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Reject every other proposed quote on the case. Returns how many
    /// quotes changed.
    async fn reject_competing_quotes(
        &mut self,
        case_id: &CaseId,
        winner: &QuoteId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Move a case from `open` to `engaged`.
    async fn engage_case(&mut self, id: &CaseId, at: DateTime<Utc>)
    -> Result<bool, RepositoryError>;

    /// Move a payment from `pending` to `succeeded`.
    async fn mark_payment_succeeded(
        &mut self,
        id: &PaymentId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Make every change visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    /// Discard every change.
    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

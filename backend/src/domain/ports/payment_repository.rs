//! Port abstraction for payment lookups.
use async_trait::async_trait;

use crate::domain::{Payment, QuoteId};

use super::RepositoryError;

/// Read access to payment attempts. Writes happen inside
/// [`super::StoreTransaction`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Resolve a payment from the provider's link identifier.
    async fn find_by_link_id(&self, link_id: &str) -> Result<Option<Payment>, RepositoryError>;

    /// Most recently created payment attempt for a quote.
    async fn latest_for_quote(&self, quote_id: &QuoteId)
    -> Result<Option<Payment>, RepositoryError>;
}

//! PostgreSQL-backed `PaymentRepository` implementation using Diesel ORM.
//!
//! Payments are only read here; inserts and status changes happen inside
//! settlement transactions (see `diesel_transactional_store`).

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PaymentRepository, RepositoryError};
use crate::domain::{Payment, QuoteId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::PaymentRow;
use super::pool::DbPool;
use super::schema::payments;

/// Diesel-backed implementation of the payment repository port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn find_by_link_id(&self, link_id: &str) -> Result<Option<Payment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        payments::table
            .filter(payments::payment_link_id.eq(link_id))
            .select(PaymentRow::as_select())
            .order(payments::created_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Payment::try_from)
            .transpose()
    }

    async fn latest_for_quote(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        payments::table
            .filter(payments::quote_id.eq(*quote_id.as_uuid()))
            .select(PaymentRow::as_select())
            .order(payments::created_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Payment::try_from)
            .transpose()
    }
}

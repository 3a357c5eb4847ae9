//! PostgreSQL transactions for the settlement protocol.
//!
//! Each transaction owns one pooled connection for its lifetime. Status
//! reads take `FOR UPDATE` row locks and every mutation is conditional on
//! the expected prior status, so a concurrent settlement either blocks on
//! the lock or changes zero rows.
//!
//! A handle dropped without `commit` or `rollback` leaves its connection in
//! an open transaction; the pool manager treats such connections as broken
//! and closes them, which makes PostgreSQL discard the changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};

use crate::domain::ports::{RepositoryError, StoreTransaction, TransactionalStore};
use crate::domain::{
    CaseId, CaseStatus, Payment, PaymentId, PaymentStatus, QuoteId, QuoteStatus,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::PaymentRow;
use super::pool::DbPool;
use super::schema::{cases, payments, quotes};

/// Opens PostgreSQL transactions from the shared pool.
#[derive(Clone)]
pub struct DieselTransactionalStore {
    pool: DbPool,
}

impl DieselTransactionalStore {
    /// Create a store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionalStore for DieselTransactionalStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepositoryError> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::begin_transaction(
            &mut *conn,
        )
        .await
        .map_err(map_diesel_error)?;
        Ok(Box::new(DieselStoreTransaction { conn }))
    }
}

struct DieselStoreTransaction {
    conn: PooledConnection<'static, AsyncPgConnection>,
}

fn parse_status<T>(raw: Option<String>, column: &str) -> Result<Option<T>, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|err| RepositoryError::query(format!("corrupt {column} column: {err}")))
    })
    .transpose()
}

#[async_trait]
impl StoreTransaction for DieselStoreTransaction {
    async fn quote_status(&mut self, id: &QuoteId) -> Result<Option<QuoteStatus>, RepositoryError> {
        let raw: Option<String> = quotes::table
            .filter(quotes::id.eq(*id.as_uuid()))
            .select(quotes::status)
            .for_update()
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        parse_status(raw, "quotes.status")
    }

    async fn case_status(&mut self, id: &CaseId) -> Result<Option<CaseStatus>, RepositoryError> {
        let raw: Option<String> = cases::table
            .filter(cases::id.eq(*id.as_uuid()))
            .select(cases::status)
            .for_update()
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        parse_status(raw, "cases.status")
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), RepositoryError> {
        diesel::insert_into(payments::table)
            .values(&PaymentRow::from(payment))
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn accept_quote(
        &mut self,
        id: &QuoteId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let updated = diesel::update(
            quotes::table
                .filter(quotes::id.eq(*id.as_uuid()))
                .filter(quotes::status.eq(QuoteStatus::Proposed.as_str())),
        )
        .set((
            quotes::status.eq(QuoteStatus::Accepted.as_str()),
            quotes::updated_at.eq(at),
        ))
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn reject_competing_quotes(
        &mut self,
        case_id: &CaseId,
        winner: &QuoteId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let updated = diesel::update(
            quotes::table
                .filter(quotes::case_id.eq(*case_id.as_uuid()))
                .filter(quotes::id.ne(*winner.as_uuid()))
                .filter(quotes::status.eq(QuoteStatus::Proposed.as_str())),
        )
        .set((
            quotes::status.eq(QuoteStatus::Rejected.as_str()),
            quotes::updated_at.eq(at),
        ))
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated as u64)
    }

    async fn engage_case(&mut self, id: &CaseId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let updated = diesel::update(
            cases::table
                .filter(cases::id.eq(*id.as_uuid()))
                .filter(cases::status.eq(CaseStatus::Open.as_str())),
        )
        .set((
            cases::status.eq(CaseStatus::Engaged.as_str()),
            cases::updated_at.eq(at),
        ))
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn mark_payment_succeeded(
        &mut self,
        id: &PaymentId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let updated = diesel::update(
            payments::table
                .filter(payments::id.eq(*id.as_uuid()))
                .filter(payments::status.eq(PaymentStatus::Pending.as_str())),
        )
        .set((
            payments::status.eq(PaymentStatus::Succeeded.as_str()),
            payments::updated_at.eq(at),
        ))
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), RepositoryError> {
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::commit_transaction(
            &mut *self.conn,
        )
        .await
        .map_err(map_diesel_error)
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), RepositoryError> {
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::rollback_transaction(
            &mut *self.conn,
        )
        .await
        .map_err(map_diesel_error)
    }
}

//! In-process store implementing every persistence port.
//!
//! Used when no database URL is configured and throughout the test-suite.
//! All tables sit behind one `tokio` mutex. A transaction takes the lock
//! for its whole lifetime and edits a working copy that replaces the tables
//! on commit, so transactions are fully serialised and a dropped handle
//! leaves no trace.

mod tables;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ports::{
    CaseFileRepository, CaseRepository, PaymentRepository, QuoteRepository, RepositoryError,
    StoreTransaction, TransactionalStore, UserRepository,
};
use crate::domain::{
    Case, CaseFile, CaseFileId, CaseId, CaseStatus, CaseSummary, EmailAddress, OpenCaseFilter,
    PageRequest, Payment, PaymentId, Quote, QuoteId, QuoteStatus, User, UserId,
};

use self::tables::{Tables, paginate};

/// Shared in-memory tables. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        self.tables.lock().await.insert_user(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .users
            .values()
            .find(|user| user.email == *email)
            .cloned())
    }
}

#[async_trait]
impl CaseRepository for InMemoryStore {
    async fn create(&self, case: &Case) -> Result<(), RepositoryError> {
        self.tables.lock().await.cases.insert(case.id, case.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError> {
        Ok(self.tables.lock().await.cases.get(id).cloned())
    }

    async fn list_for_client(
        &self,
        client_id: &UserId,
        page: PageRequest,
    ) -> Result<(Vec<CaseSummary>, u64), RepositoryError> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<&Case> = tables
            .cases
            .values()
            .filter(|case| case.client_id == *client_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let summaries = owned
            .into_iter()
            .map(|case| CaseSummary {
                case: case.clone(),
                quote_count: tables.quote_count(&case.id),
            })
            .collect();
        Ok(paginate(summaries, page.offset(), page.limit()))
    }

    async fn list_open(
        &self,
        filter: &OpenCaseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Case>, u64), RepositoryError> {
        let tables = self.tables.lock().await;
        let mut open: Vec<Case> = tables
            .cases
            .values()
            .filter(|case| filter.matches(case))
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(open, page.offset(), page.limit()))
    }
}

#[async_trait]
impl QuoteRepository for InMemoryStore {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError> {
        self.tables.lock().await.insert_quote(quote)
    }

    async fn update_terms(&self, quote: &Quote) -> Result<bool, RepositoryError> {
        Ok(self.tables.lock().await.update_quote_terms(quote))
    }

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        Ok(self.tables.lock().await.quotes.get(id).cloned())
    }

    async fn find_by_case_and_lawyer(
        &self,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Option<Quote>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .quotes
            .values()
            .find(|quote| quote.case_id == *case_id && quote.lawyer_id == *lawyer_id)
            .cloned())
    }

    async fn find_accepted_for_case(
        &self,
        case_id: &CaseId,
    ) -> Result<Option<Quote>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .quotes
            .values()
            .find(|quote| quote.case_id == *case_id && quote.status == QuoteStatus::Accepted)
            .cloned())
    }

    async fn list_for_case(&self, case_id: &CaseId) -> Result<Vec<Quote>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut quotes: Vec<Quote> = tables
            .quotes
            .values()
            .filter(|quote| quote.case_id == *case_id)
            .cloned()
            .collect();
        quotes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(quotes)
    }

    async fn list_for_lawyer(
        &self,
        lawyer_id: &UserId,
        status: Option<QuoteStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Quote>, u64), RepositoryError> {
        let tables = self.tables.lock().await;
        let mut quotes: Vec<Quote> = tables
            .quotes
            .values()
            .filter(|quote| {
                quote.lawyer_id == *lawyer_id && status.is_none_or(|wanted| quote.status == wanted)
            })
            .cloned()
            .collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(quotes, page.offset(), page.limit()))
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn find_by_link_id(&self, link_id: &str) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .payments
            .values()
            .find(|payment| payment.payment_link_id == link_id)
            .cloned())
    }

    async fn latest_for_quote(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .payments
            .values()
            .filter(|payment| payment.quote_id == *quote_id)
            .max_by_key(|payment| payment.created_at)
            .cloned())
    }
}

#[async_trait]
impl CaseFileRepository for InMemoryStore {
    async fn create(&self, file: &CaseFile) -> Result<(), RepositoryError> {
        self.tables.lock().await.files.insert(file.id, file.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CaseFileId) -> Result<Option<CaseFile>, RepositoryError> {
        Ok(self.tables.lock().await.files.get(id).cloned())
    }

    async fn count_for_case(&self, case_id: &CaseId) -> Result<u64, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .files
            .values()
            .filter(|file| file.case_id == *case_id)
            .count() as u64)
    }

    async fn list_for_case(&self, case_id: &CaseId) -> Result<Vec<CaseFile>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut files: Vec<CaseFile> = tables
            .files
            .values()
            .filter(|file| file.case_id == *case_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(files)
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

/// Exclusive transaction over the whole store.
struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn quote_status(&mut self, id: &QuoteId) -> Result<Option<QuoteStatus>, RepositoryError> {
        Ok(self.working.quotes.get(id).map(|quote| quote.status))
    }

    async fn case_status(&mut self, id: &CaseId) -> Result<Option<CaseStatus>, RepositoryError> {
        Ok(self.working.cases.get(id).map(|case| case.status))
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), RepositoryError> {
        self.working.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn accept_quote(
        &mut self,
        id: &QuoteId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        self.working.accept_quote(id, at)
    }

    async fn reject_competing_quotes(
        &mut self,
        case_id: &CaseId,
        winner: &QuoteId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        Ok(self.working.reject_competing_quotes(case_id, winner, at))
    }

    async fn engage_case(&mut self, id: &CaseId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        Ok(self.working.engage_case(id, at))
    }

    async fn mark_payment_succeeded(
        &mut self,
        id: &PaymentId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.working.mark_payment_succeeded(id, at))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

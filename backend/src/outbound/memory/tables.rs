//! Table state and the constraints the SQL schema would enforce.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::ports::{
    QUOTES_CASE_LAWYER_KEY, QUOTES_ONE_ACCEPTED_PER_CASE, RepositoryError, USERS_EMAIL_KEY,
};
use crate::domain::{
    Case, CaseFile, CaseFileId, CaseId, CaseStatus, Payment, PaymentId, PaymentStatus, Quote,
    QuoteId, QuoteStatus, User, UserId,
};

#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    pub users: BTreeMap<UserId, User>,
    pub cases: BTreeMap<CaseId, Case>,
    pub quotes: BTreeMap<QuoteId, Quote>,
    pub payments: BTreeMap<PaymentId, Payment>,
    pub files: BTreeMap<CaseFileId, CaseFile>,
}

impl Tables {
    pub fn insert_user(&mut self, user: &User) -> Result<(), RepositoryError> {
        if self.users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::unique_violation(USERS_EMAIL_KEY));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    pub fn insert_quote(&mut self, quote: &Quote) -> Result<(), RepositoryError> {
        let duplicate = self
            .quotes
            .values()
            .any(|existing| existing.case_id == quote.case_id && existing.lawyer_id == quote.lawyer_id);
        if duplicate {
            return Err(RepositoryError::unique_violation(QUOTES_CASE_LAWYER_KEY));
        }
        self.quotes.insert(quote.id, quote.clone());
        Ok(())
    }

    /// Overwrite terms and reopen the quote, provided it is not accepted
    /// and its case is still open.
    pub fn update_quote_terms(&mut self, quote: &Quote) -> bool {
        let Some(case_id) = self.quotes.get(&quote.id).map(|stored| stored.case_id) else {
            return false;
        };
        let case_open = self
            .cases
            .get(&case_id)
            .is_some_and(|case| case.status == CaseStatus::Open);
        match self.quotes.get_mut(&quote.id) {
            Some(stored) if case_open && stored.status != QuoteStatus::Accepted => {
                stored.amount = quote.amount;
                stored.expected_days = quote.expected_days;
                stored.note.clone_from(&quote.note);
                stored.status = QuoteStatus::Proposed;
                stored.updated_at = quote.updated_at;
                true
            }
            _ => false,
        }
    }

    pub fn accept_quote(&mut self, id: &QuoteId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let Some(case_id) = self
            .quotes
            .get(id)
            .filter(|quote| quote.status == QuoteStatus::Proposed)
            .map(|quote| quote.case_id)
        else {
            return Ok(false);
        };
        let already_accepted = self
            .quotes
            .values()
            .any(|quote| quote.case_id == case_id && quote.status == QuoteStatus::Accepted);
        if already_accepted {
            return Err(RepositoryError::unique_violation(QUOTES_ONE_ACCEPTED_PER_CASE));
        }
        if let Some(quote) = self.quotes.get_mut(id) {
            quote.status = QuoteStatus::Accepted;
            quote.updated_at = at;
        }
        Ok(true)
    }

    pub fn reject_competing_quotes(
        &mut self,
        case_id: &CaseId,
        winner: &QuoteId,
        at: DateTime<Utc>,
    ) -> u64 {
        let mut changed = 0;
        for quote in self.quotes.values_mut().filter(|quote| {
            quote.case_id == *case_id && quote.id != *winner && quote.status == QuoteStatus::Proposed
        }) {
            quote.status = QuoteStatus::Rejected;
            quote.updated_at = at;
            changed += 1;
        }
        changed
    }

    pub fn engage_case(&mut self, id: &CaseId, at: DateTime<Utc>) -> bool {
        match self.cases.get_mut(id) {
            Some(case) if case.status == CaseStatus::Open => {
                case.status = CaseStatus::Engaged;
                case.updated_at = at;
                true
            }
            _ => false,
        }
    }

    pub fn mark_payment_succeeded(&mut self, id: &PaymentId, at: DateTime<Utc>) -> bool {
        match self.payments.get_mut(id) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = PaymentStatus::Succeeded;
                payment.updated_at = at;
                true
            }
            _ => false,
        }
    }

    pub fn quote_count(&self, case_id: &CaseId) -> u64 {
        self.quotes
            .values()
            .filter(|quote| quote.case_id == *case_id)
            .count() as u64
    }
}

/// Slice `items` for one page.
pub(super) fn paginate<T>(items: Vec<T>, offset: u64, limit: u64) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let page = items
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect();
    (page, total)
}

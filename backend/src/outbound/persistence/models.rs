//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain types run
//! the domain parsers so a corrupt row surfaces as a query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Case, CaseFile, CaseFileId, CaseId, CaseStatus, EmailAddress, Payment, PaymentId,
    PaymentStatus, Quote, QuoteAmount, QuoteId, QuoteStatus, Role, User, UserId,
};

use super::schema::{case_files, cases, payments, quotes, users};

fn corrupt(column: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::query(format!("corrupt {column} column: {error}"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub jurisdiction: Option<String>,
    pub bar_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            email: user.email.as_str().to_owned(),
            password_hash: user.password_hash.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_owned(),
            jurisdiction: user.jurisdiction.clone(),
            bar_number: user.bar_number.clone(),
            created_at: user.created_at,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            email: EmailAddress::parse(&row.email).map_err(|err| corrupt("users.email", err))?,
            password_hash: row.password_hash,
            name: row.name,
            role: row.role.parse::<Role>().map_err(|err| corrupt("users.role", err))?,
            jurisdiction: row.jurisdiction,
            bar_number: row.bar_number,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = cases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CaseRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Case> for CaseRow {
    fn from(case: &Case) -> Self {
        Self {
            id: *case.id.as_uuid(),
            client_id: *case.client_id.as_uuid(),
            title: case.title.clone(),
            category: case.category.clone(),
            description: case.description.clone(),
            status: case.status.as_str().to_owned(),
            created_at: case.created_at,
            updated_at: case.updated_at,
        }
    }
}

impl TryFrom<CaseRow> for Case {
    type Error = RepositoryError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CaseId::from_uuid(row.id),
            client_id: UserId::from_uuid(row.client_id),
            title: row.title,
            category: row.category,
            description: row.description,
            status: row
                .status
                .parse::<CaseStatus>()
                .map_err(|err| corrupt("cases.status", err))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = quotes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct QuoteRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub lawyer_id: Uuid,
    pub amount: Decimal,
    pub expected_days: i32,
    pub note: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns rewritten when a lawyer revises a quote.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = quotes)]
pub(crate) struct QuoteTermsUpdate<'a> {
    pub amount: Decimal,
    pub expected_days: i32,
    pub note: &'a str,
    pub status: &'a str,
    pub updated_at: DateTime<Utc>,
}

fn expected_days_column(days: u32) -> Result<i32, RepositoryError> {
    i32::try_from(days).map_err(|err| RepositoryError::query(format!("expected_days: {err}")))
}

impl<'a> QuoteTermsUpdate<'a> {
    pub fn from_quote(quote: &'a Quote) -> Result<Self, RepositoryError> {
        Ok(Self {
            amount: quote.amount.as_decimal(),
            expected_days: expected_days_column(quote.expected_days)?,
            note: &quote.note,
            status: QuoteStatus::Proposed.as_str(),
            updated_at: quote.updated_at,
        })
    }
}

impl TryFrom<&Quote> for QuoteRow {
    type Error = RepositoryError;

    fn try_from(quote: &Quote) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *quote.id.as_uuid(),
            case_id: *quote.case_id.as_uuid(),
            lawyer_id: *quote.lawyer_id.as_uuid(),
            amount: quote.amount.as_decimal(),
            expected_days: expected_days_column(quote.expected_days)?,
            note: quote.note.clone(),
            status: quote.status.as_str().to_owned(),
            created_at: quote.created_at,
            updated_at: quote.updated_at,
        })
    }
}

impl TryFrom<QuoteRow> for Quote {
    type Error = RepositoryError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: QuoteId::from_uuid(row.id),
            case_id: CaseId::from_uuid(row.case_id),
            lawyer_id: UserId::from_uuid(row.lawyer_id),
            amount: QuoteAmount::try_from(row.amount)
                .map_err(|err| corrupt("quotes.amount", err))?,
            expected_days: u32::try_from(row.expected_days)
                .map_err(|err| corrupt("quotes.expected_days", err))?,
            note: row.note,
            status: row
                .status
                .parse::<QuoteStatus>()
                .map_err(|err| corrupt("quotes.status", err))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub payment_link_id: String,
    pub amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentRow {
    fn from(payment: &Payment) -> Self {
        Self {
            id: *payment.id.as_uuid(),
            quote_id: *payment.quote_id.as_uuid(),
            payment_link_id: payment.payment_link_id.clone(),
            amount: payment.amount,
            status: payment.status.as_str().to_owned(),
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PaymentId::from_uuid(row.id),
            quote_id: QuoteId::from_uuid(row.quote_id),
            payment_link_id: row.payment_link_id,
            amount: row.amount,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|err| corrupt("payments.status", err))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Case files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = case_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CaseFileRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&CaseFile> for CaseFileRow {
    type Error = RepositoryError;

    fn try_from(file: &CaseFile) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *file.id.as_uuid(),
            case_id: *file.case_id.as_uuid(),
            file_name: file.file_name.clone(),
            storage_path: file.storage_path.clone(),
            file_size: i64::try_from(file.file_size)
                .map_err(|err| RepositoryError::query(format!("file_size: {err}")))?,
            mime_type: file.mime_type.clone(),
            created_at: file.created_at,
        })
    }
}

impl TryFrom<CaseFileRow> for CaseFile {
    type Error = RepositoryError;

    fn try_from(row: CaseFileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CaseFileId::from_uuid(row.id),
            case_id: CaseId::from_uuid(row.case_id),
            file_name: row.file_name,
            storage_path: row.storage_path,
            file_size: u64::try_from(row.file_size)
                .map_err(|err| corrupt("case_files.file_size", err))?,
            mime_type: row.mime_type,
            created_at: row.created_at,
        })
    }
}

/// Convert every row, failing on the first corrupt one.
pub(crate) fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, RepositoryError>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}

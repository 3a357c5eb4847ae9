//! Lawyer quotes on cases.
//!
//! A quote is `proposed` until a settlement either accepts it or rejects it
//! in favour of a sibling. Accepted quotes are terminal; rejected quotes may
//! be revised back into the pool while their case is still open.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::{CaseId, QuoteId, UserId};

/// Validation failures for quote input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteValidationError {
    #[error("amount must be a decimal number")]
    MalformedAmount,
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("amount is too large to charge")]
    AmountOutOfRange,
    #[error("expected days must be at least 1")]
    InvalidExpectedDays,
    #[error("unknown quote status: {0}")]
    UnknownStatus(String),
}

/// Lifecycle state of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Proposed,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = QuoteValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(Self::Proposed),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(QuoteValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Non-negative exact decimal amount in major currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuoteAmount(Decimal);

const MINOR_UNITS_PER_MAJOR: Decimal = Decimal::ONE_HUNDRED;

impl QuoteAmount {
    /// Parse a decimal string such as `"1234.56"`.
    ///
    /// # Examples
    /// ```
    /// use docket::domain::QuoteAmount;
    ///
    /// let amount = QuoteAmount::parse("1234.56").expect("valid amount");
    /// assert_eq!(amount.to_minor_units(), Ok(123_456));
    /// assert!(QuoteAmount::parse("-1").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, QuoteValidationError> {
        let value = Decimal::from_str_exact(raw.trim())
            .map_err(|_| QuoteValidationError::MalformedAmount)?;
        Self::try_from(value)
    }

    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Integer minor units (cents), truncating any fraction below one cent
    /// toward zero.
    pub fn to_minor_units(&self) -> Result<i64, QuoteValidationError> {
        self.0
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .map(|scaled| scaled.trunc())
            .and_then(|whole| whole.to_i64())
            .ok_or(QuoteValidationError::AmountOutOfRange)
    }
}

impl TryFrom<Decimal> for QuoteAmount {
    type Error = QuoteValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(QuoteValidationError::NegativeAmount);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for QuoteAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Price, estimate and note offered by a lawyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTerms {
    amount: QuoteAmount,
    expected_days: u32,
    note: String,
}

impl QuoteTerms {
    /// Validate raw terms.
    pub fn new(amount: &str, expected_days: i64, note: &str) -> Result<Self, QuoteValidationError> {
        let amount = QuoteAmount::parse(amount)?;
        let expected_days = u32::try_from(expected_days)
            .ok()
            .filter(|days| *days >= 1)
            .ok_or(QuoteValidationError::InvalidExpectedDays)?;
        Ok(Self {
            amount,
            expected_days,
            note: note.trim().to_owned(),
        })
    }

    #[must_use]
    pub const fn amount(&self) -> QuoteAmount {
        self.amount
    }

    #[must_use]
    pub const fn expected_days(&self) -> u32 {
        self.expected_days
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }
}

/// Returned when revising a quote that has already been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("quote has already been accepted")]
pub struct QuoteAlreadyAccepted;

/// A lawyer's priced offer on a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: QuoteId,
    pub case_id: CaseId,
    pub lawyer_id: UserId,
    pub amount: QuoteAmount,
    pub expected_days: u32,
    pub note: String,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Propose new terms on a case.
    #[must_use]
    pub fn propose(case_id: CaseId, lawyer_id: UserId, terms: QuoteTerms, now: DateTime<Utc>) -> Self {
        Self {
            id: QuoteId::random(),
            case_id,
            lawyer_id,
            amount: terms.amount,
            expected_days: terms.expected_days,
            note: terms.note,
            status: QuoteStatus::Proposed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the terms. A rejected quote re-enters the pool as proposed.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use docket::domain::{CaseId, Quote, QuoteStatus, QuoteTerms, UserId};
    ///
    /// let terms = QuoteTerms::new("100", 3, "").expect("valid terms");
    /// let mut quote = Quote::propose(CaseId::random(), UserId::random(), terms.clone(), Utc::now());
    /// quote.status = QuoteStatus::Rejected;
    /// quote.revise(terms, Utc::now()).expect("rejected quotes can be revised");
    /// assert_eq!(quote.status, QuoteStatus::Proposed);
    /// ```
    pub fn revise(
        &mut self,
        terms: QuoteTerms,
        now: DateTime<Utc>,
    ) -> Result<(), QuoteAlreadyAccepted> {
        if self.status == QuoteStatus::Accepted {
            return Err(QuoteAlreadyAccepted);
        }
        self.amount = terms.amount;
        self.expected_days = terms.expected_days;
        self.note = terms.note;
        self.status = QuoteStatus::Proposed;
        self.updated_at = now;
        Ok(())
    }

    #[must_use]
    pub fn is_proposed(&self) -> bool {
        self.status == QuoteStatus::Proposed
    }
}

//! Payment attempts and provider confirmations.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PaymentId, QuoteId};

/// Metadata key carrying the quote identifier on provider objects.
pub const METADATA_QUOTE_ID: &str = "quote_id";
/// Metadata key carrying the case identifier on provider objects.
pub const METADATA_CASE_ID: &str = "case_id";
/// Metadata key carrying the provider's own payment-link identifier.
pub const METADATA_PAYMENT_LINK_ID: &str = "payment_link_id";

/// Raised when a stored payment status is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownPaymentStatus(pub String);

/// Lifecycle state of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            other => Err(UnknownPaymentStatus(other.to_owned())),
        }
    }
}

/// One acceptance attempt for a quote, keyed by the provider link id.
///
/// Abandoned attempts stay `pending` forever; they never block a later
/// attempt on the same quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    pub quote_id: QuoteId,
    pub payment_link_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Record a new pending attempt.
    #[must_use]
    pub fn pending(
        quote_id: QuoteId,
        payment_link_id: impl Into<String>,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::random(),
            quote_id,
            payment_link_id: payment_link_id.into(),
            amount,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payable link returned by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    pub url: String,
}

/// Asynchronous completion event delivered by the payment provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Whether the provider reports the payment as completed.
    pub paid: bool,
    /// Direct payment-link reference, when the event carries one.
    pub payment_link: Option<String>,
    /// Metadata echoed back from the payable link.
    pub metadata: BTreeMap<String, String>,
}

impl PaymentConfirmation {
    fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Link reference carried by the event itself, preferring the direct
    /// field over metadata.
    #[must_use]
    pub fn link_reference(&self) -> Option<&str> {
        self.payment_link
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| self.metadata_value(METADATA_PAYMENT_LINK_ID))
    }

    /// Quote identifier from metadata, if present and well formed.
    #[must_use]
    pub fn quote_id(&self) -> Option<QuoteId> {
        self.metadata_value(METADATA_QUOTE_ID)
            .and_then(|raw| raw.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation(link: Option<&str>, metadata: &[(&str, &str)]) -> PaymentConfirmation {
        PaymentConfirmation {
            paid: true,
            payment_link: link.map(str::to_owned),
            metadata: metadata
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn direct_link_wins_over_metadata() {
        let event = confirmation(Some("plink_direct"), &[(METADATA_PAYMENT_LINK_ID, "plink_meta")]);
        assert_eq!(event.link_reference(), Some("plink_direct"));
    }

    #[test]
    fn blank_direct_link_falls_back_to_metadata() {
        let event = confirmation(Some(" "), &[(METADATA_PAYMENT_LINK_ID, "plink_meta")]);
        assert_eq!(event.link_reference(), Some("plink_meta"));
    }

    #[test]
    fn empty_metadata_link_yields_none() {
        let event = confirmation(None, &[(METADATA_PAYMENT_LINK_ID, "")]);
        assert_eq!(event.link_reference(), None);
    }

    #[test]
    fn parses_quote_id_from_metadata() {
        let id = QuoteId::random();
        let event = confirmation(None, &[(METADATA_QUOTE_ID, &id.to_string())]);
        assert_eq!(event.quote_id(), Some(id));
        assert_eq!(confirmation(None, &[(METADATA_QUOTE_ID, "junk")]).quote_id(), None);
    }
}

//! Driving port for the quote-acceptance and payment-settlement protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{CaseId, Error, PaymentConfirmation, PaymentId, QuoteId, UserId};

/// Payable link handed back to the client after requesting acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceResponse {
    /// Provider payment-link identifier.
    pub payment_intent_id: String,
    pub payment_link_url: String,
}

/// Entities moved by a successful settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementReceipt {
    pub payment_id: PaymentId,
    pub quote_id: QuoteId,
    pub case_id: CaseId,
}

/// Settlement use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettlementCommand: Send + Sync {
    /// Create a payable link for a proposed quote on the client's open case.
    ///
    /// No case or quote state changes here; only a pending payment is
    /// recorded.
    ///
    /// # Errors
    ///
    /// `not_found`, `forbidden` for a non-owner, `invalid_state` when the
    /// case is not open or the quote not proposed, `conflict` when a
    /// concurrent request got there first, `gateway_failure` when the
    /// provider fails.
    async fn request_acceptance(
        &self,
        quote_id: &QuoteId,
        client_id: &UserId,
    ) -> Result<AcceptanceResponse, Error>;

    /// Apply a provider completion event.
    ///
    /// Accepts the quote, rejects its siblings, engages the case and marks
    /// the payment succeeded in one transaction.
    ///
    /// # Errors
    ///
    /// `invalid_state` when the event is not a completed payment,
    /// `not_found` when it cannot be matched to a payment, `conflict` when
    /// the quote or case was already settled.
    async fn confirm_settlement(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<SettlementReceipt, Error>;
}

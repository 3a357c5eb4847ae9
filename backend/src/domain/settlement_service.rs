//! Quote acceptance and payment settlement.
//!
//! Acceptance is two-phase. [`SettlementCommand::request_acceptance`] only
//! records a pending payment against a fresh payable link; the case and
//! quote are untouched. [`SettlementCommand::confirm_settlement`] runs when
//! the provider reports completion and moves quote, siblings, case and
//! payment in one transaction.
//!
//! Both phases check state before opening a transaction and again inside
//! it. The inner check closes the window between the first read and the
//! transaction start; conditional writes close the rest.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    AcceptanceResponse, CaseRepository, Notification, NotificationPublisher, PayableLinkRequest,
    PaymentGateway, PaymentRepository, QuoteRepository, SettlementCommand, SettlementReceipt,
    StoreTransaction, TransactionalStore,
};
use crate::domain::service_support::{map_repository_error, require_case, require_quote};
use crate::domain::{
    Case, CaseId, CaseStatus, Error, METADATA_CASE_ID, METADATA_PAYMENT_LINK_ID,
    METADATA_QUOTE_ID, Payment, PaymentConfirmation, QuoteStatus, Quote, QuoteId, UserId,
};

/// Event name emitted once a settlement commits.
pub const PAYMENT_COMPLETED_EVENT: &str = "payment-completed";

/// Notification channel for a payment link.
#[must_use]
pub fn payment_channel(payment_link_id: &str) -> String {
    format!("payment-{payment_link_id}")
}

/// Port bundle required by the settlement service.
pub struct SettlementPorts {
    pub cases: Arc<dyn CaseRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub store: Arc<dyn TransactionalStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifications: Arc<dyn NotificationPublisher>,
}

/// Provider-facing settings for payable links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementConfig {
    /// Lower-case ISO 4217 currency code.
    pub currency: String,
    /// Base URL of the client application, without a trailing slash.
    pub frontend_url: String,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            currency: "sgd".to_owned(),
            frontend_url: "http://localhost:3000".to_owned(),
        }
    }
}

impl SettlementConfig {
    fn processing_url(&self, case: &Case) -> String {
        format!(
            "{}/client/cases/{}/payment/processing",
            self.frontend_url.trim_end_matches('/'),
            case.id
        )
    }
}

fn link_metadata(quote: &Quote, payment_link_id: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (METADATA_QUOTE_ID.to_owned(), quote.id.to_string()),
        (METADATA_CASE_ID.to_owned(), quote.case_id.to_string()),
        (
            METADATA_PAYMENT_LINK_ID.to_owned(),
            payment_link_id.to_owned(),
        ),
    ])
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    tx: Box<dyn StoreTransaction>,
    outcome: Result<T, Error>,
) -> Result<T, Error> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(map_repository_error)?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, "settlement rollback failed");
            }
            Err(error)
        }
    }
}

async fn require_proposed_in_tx(
    tx: &mut dyn StoreTransaction,
    quote_id: &QuoteId,
) -> Result<(), Error> {
    match tx
        .quote_status(quote_id)
        .await
        .map_err(map_repository_error)?
    {
        Some(QuoteStatus::Proposed) => Ok(()),
        Some(_) => Err(Error::conflict("quote was already processed")),
        None => Err(Error::not_found("quote not found")),
    }
}

async fn require_open_case_in_tx(
    tx: &mut dyn StoreTransaction,
    case_id: &CaseId,
) -> Result<(), Error> {
    match tx.case_status(case_id).await.map_err(map_repository_error)? {
        Some(CaseStatus::Open) => Ok(()),
        Some(_) => Err(Error::conflict("case was already processed")),
        None => Err(Error::not_found("case not found")),
    }
}

/// Settlement service implementing [`SettlementCommand`].
pub struct SettlementService {
    cases: Arc<dyn CaseRepository>,
    quotes: Arc<dyn QuoteRepository>,
    payments: Arc<dyn PaymentRepository>,
    store: Arc<dyn TransactionalStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: Arc<dyn NotificationPublisher>,
    config: SettlementConfig,
    clock: Arc<dyn Clock>,
}

impl SettlementService {
    /// Create the service.
    pub fn new(ports: SettlementPorts, config: SettlementConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            cases: ports.cases,
            quotes: ports.quotes,
            payments: ports.payments,
            store: ports.store,
            gateway: ports.gateway,
            notifications: ports.notifications,
            config,
            clock,
        }
    }

    /// Inside the acceptance transaction: re-check, create the link, record
    /// the pending payment.
    async fn record_pending_payment(
        &self,
        tx: &mut dyn StoreTransaction,
        quote: &Quote,
        case: &Case,
        amount_minor_units: i64,
    ) -> Result<AcceptanceResponse, Error> {
        require_proposed_in_tx(tx, &quote.id).await?;

        let processing_url = self.config.processing_url(case);
        let request = PayableLinkRequest {
            amount_minor_units,
            currency: self.config.currency.clone(),
            product_name: format!("Legal Services - Case: {}", case.title),
            metadata: link_metadata(quote, ""),
            redirect_url: processing_url.clone(),
        };
        let link = self
            .gateway
            .create_payable_link(&request)
            .await
            .map_err(|err| {
                warn!(quote_id = %quote.id, error = %err, "payable link creation failed");
                Error::gateway_failure(format!("failed to create payment link: {err}"))
            })?;

        let redirect = format!("{processing_url}?payment_link_id={}", link.id);
        if let Err(err) = self
            .gateway
            .update_payable_link(&link.id, &link_metadata(quote, &link.id), &redirect)
            .await
        {
            warn!(payment_link_id = %link.id, error = %err, "payable link update failed");
        }

        let payment = Payment::pending(
            quote.id,
            link.id.clone(),
            quote.amount.as_decimal(),
            self.clock.utc(),
        );
        tx.insert_payment(&payment)
            .await
            .map_err(map_repository_error)?;

        Ok(AcceptanceResponse {
            payment_intent_id: link.id,
            payment_link_url: link.url,
        })
    }

    /// Inside the settlement transaction: re-check, then apply all four
    /// transitions. Any refused conditional write aborts the whole set.
    async fn apply_settlement(
        tx: &mut dyn StoreTransaction,
        payment: &Payment,
        quote: &Quote,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        require_proposed_in_tx(tx, &quote.id).await?;
        require_open_case_in_tx(tx, &quote.case_id).await?;

        if !tx
            .accept_quote(&quote.id, now)
            .await
            .map_err(map_repository_error)?
        {
            return Err(Error::conflict("quote was already processed"));
        }
        tx.reject_competing_quotes(&quote.case_id, &quote.id, now)
            .await
            .map_err(map_repository_error)?;
        if !tx
            .engage_case(&quote.case_id, now)
            .await
            .map_err(map_repository_error)?
        {
            return Err(Error::conflict("case was already processed"));
        }
        if !tx
            .mark_payment_succeeded(&payment.id, now)
            .await
            .map_err(map_repository_error)?
        {
            return Err(Error::conflict("payment was already processed"));
        }
        Ok(())
    }

    /// Direct link field, then metadata, then the latest payment for the
    /// quote named in metadata.
    async fn resolve_link_id(&self, confirmation: &PaymentConfirmation) -> Result<String, Error> {
        if let Some(link_id) = confirmation.link_reference() {
            return Ok(link_id.to_owned());
        }
        let Some(quote_id) = confirmation.quote_id() else {
            return Err(Error::not_found("payment link reference not found"));
        };
        self.payments
            .latest_for_quote(&quote_id)
            .await
            .map_err(map_repository_error)?
            .map(|payment| payment.payment_link_id)
            .ok_or_else(|| Error::not_found("payment link reference not found"))
    }

    async fn announce(&self, payment_link_id: &str, receipt: &SettlementReceipt) {
        let notification = Notification::new(
            payment_channel(payment_link_id),
            PAYMENT_COMPLETED_EVENT,
            json!({
                "payment_id": receipt.payment_id,
                "payment_status": "succeeded",
                "quote_id": receipt.quote_id,
                "quote_status": "accepted",
                "case_id": receipt.case_id,
                "case_status": "engaged",
                "is_completed": true,
            }),
        );
        if let Err(err) = self.notifications.emit(notification).await {
            warn!(payment_link_id, error = %err, "settlement notification failed");
        }
    }
}

#[async_trait]
impl SettlementCommand for SettlementService {
    async fn request_acceptance(
        &self,
        quote_id: &QuoteId,
        client_id: &UserId,
    ) -> Result<AcceptanceResponse, Error> {
        let quote = require_quote(self.quotes.as_ref(), quote_id).await?;
        let case = require_case(self.cases.as_ref(), &quote.case_id).await?;
        if !case.is_owned_by(client_id) {
            return Err(Error::forbidden(
                "you can only accept quotes for your own cases",
            ));
        }
        if !case.is_open() {
            return Err(Error::invalid_state("case is not open for acceptance"));
        }
        if !quote.is_proposed() {
            return Err(Error::invalid_state("quote is not available for acceptance"));
        }
        let amount_minor_units = quote
            .amount
            .to_minor_units()
            .map_err(|err| Error::invalid_request(format!("invalid quote amount: {err}")))?;

        let mut tx = self.store.begin().await.map_err(map_repository_error)?;
        let outcome = self
            .record_pending_payment(tx.as_mut(), &quote, &case, amount_minor_units)
            .await;
        let response = finish(tx, outcome).await?;
        info!(
            quote_id = %quote.id,
            payment_link_id = %response.payment_intent_id,
            "acceptance requested"
        );
        Ok(response)
    }

    async fn confirm_settlement(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<SettlementReceipt, Error> {
        if !confirmation.paid {
            return Err(Error::invalid_state("payment not completed"));
        }
        let link_id = self.resolve_link_id(&confirmation).await?;
        let payment = self
            .payments
            .find_by_link_id(&link_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("payment record not found"))?;
        let quote = require_quote(self.quotes.as_ref(), &payment.quote_id).await?;
        let case = require_case(self.cases.as_ref(), &quote.case_id).await?;
        if !quote.is_proposed() {
            return Err(Error::conflict(format!(
                "quote already processed, status: {}",
                quote.status
            )));
        }
        if !case.is_open() {
            return Err(Error::conflict(format!(
                "case already processed, status: {}",
                case.status
            )));
        }

        let now = self.clock.utc();
        let mut tx = self.store.begin().await.map_err(map_repository_error)?;
        let outcome = Self::apply_settlement(tx.as_mut(), &payment, &quote, now).await;
        finish(tx, outcome).await?;

        let receipt = SettlementReceipt {
            payment_id: payment.id,
            quote_id: quote.id,
            case_id: quote.case_id,
        };
        info!(
            payment_id = %receipt.payment_id,
            quote_id = %receipt.quote_id,
            case_id = %receipt.case_id,
            "settlement committed"
        );
        self.announce(&link_id, &receipt).await;
        Ok(receipt)
    }
}

#[cfg(test)]
#[path = "settlement_service_tests.rs"]
mod tests;

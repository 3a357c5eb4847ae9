//! Driven port for the external payment provider.
//!
//! The provider is opaque to the domain: it turns an amount into a payable
//! link and later reports completion through a webhook. Product and price
//! bookkeeping stay inside the adapter.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::domain::PaymentLink;

use super::define_port_error;

/// Request for a one-off payable link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayableLinkRequest {
    /// Amount in integer minor units (cents).
    pub amount_minor_units: i64,
    /// Lower-case ISO 4217 currency code.
    pub currency: String,
    /// Name shown to the payer.
    pub product_name: String,
    /// Metadata echoed back on completion events.
    pub metadata: BTreeMap<String, String>,
    /// Where the payer lands after completing payment.
    pub redirect_url: String,
}

define_port_error! {
    /// Errors surfaced while calling the payment provider.
    pub enum PaymentGatewayError {
        /// The call exceeded its deadline.
        Timeout { message: String } => "payment provider timeout: {message}",
        /// The request never produced a usable HTTP response.
        Transport { message: String } => "payment provider transport failed: {message}",
        /// The provider refused the request.
        Rejected { status: u16, message: String } =>
            "payment provider rejected request with status {status}: {message}",
        /// The provider answered with an unexpected body.
        Decode { message: String } => "payment provider response decode failed: {message}",
    }
}

/// Port for creating payable links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payable link for `request.amount_minor_units`.
    async fn create_payable_link(
        &self,
        request: &PayableLinkRequest,
    ) -> Result<PaymentLink, PaymentGatewayError>;

    /// Replace a link's metadata and post-payment redirect.
    async fn update_payable_link(
        &self,
        link_id: &str,
        metadata: &BTreeMap<String, String>,
        redirect_url: &str,
    ) -> Result<(), PaymentGatewayError>;
}

/// Deterministic gateway used when no provider key is configured.
///
/// Links are numbered from 1 and point at `base_url`.
#[derive(Debug)]
pub struct FixturePaymentGateway {
    base_url: String,
    issued: AtomicU64,
}

impl FixturePaymentGateway {
    /// Create a fixture issuing links beneath `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            issued: AtomicU64::new(0),
        }
    }
}

impl Default for FixturePaymentGateway {
    fn default() -> Self {
        Self::new("https://pay.example.test")
    }
}

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_payable_link(
        &self,
        _request: &PayableLinkRequest,
    ) -> Result<PaymentLink, PaymentGatewayError> {
        let sequence = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("plink_fixture_{sequence}");
        Ok(PaymentLink {
            url: format!("{}/{id}", self.base_url.trim_end_matches('/')),
            id,
        })
    }

    async fn update_payable_link(
        &self,
        _link_id: &str,
        _metadata: &BTreeMap<String, String>,
        _redirect_url: &str,
    ) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

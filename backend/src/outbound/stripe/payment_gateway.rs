//! Reqwest-backed Stripe payment gateway.
//!
//! A payable link needs three calls: a product carrying the case metadata, a
//! one-off price in minor units, and the payment link itself. The adapter
//! owns transport details only: form encoding, timeouts and HTTP error
//! mapping.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{PaymentLinkDto, PriceDto, ProductDto};
use crate::domain::PaymentLink;
use crate::domain::ports::{PayableLinkRequest, PaymentGateway, PaymentGatewayError};

/// Production Stripe API origin.
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

type FormFields = Vec<(String, String)>;

/// Payment gateway that talks to the Stripe REST API.
pub struct StripePaymentGateway {
    client: Client,
    api_base: String,
    secret_key: Zeroizing<String>,
}

impl StripePaymentGateway {
    /// Build a gateway with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            secret_key: Zeroizing::new(secret_key.into()),
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &FormFields,
    ) -> Result<T, PaymentGatewayError> {
        let body = self.send_form(path, form).await?;
        serde_json::from_slice(&body).map_err(|error| {
            PaymentGatewayError::decode(format!("invalid response from {path}: {error}"))
        })
    }

    async fn send_form(
        &self,
        path: &str,
        form: &FormFields,
    ) -> Result<Vec<u8>, PaymentGatewayError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.api_base))
            .bearer_auth(self.secret_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

fn metadata_fields(metadata: &BTreeMap<String, String>) -> impl Iterator<Item = (String, String)> + '_ {
    metadata
        .iter()
        .map(|(key, value)| (format!("metadata[{key}]"), value.clone()))
}

fn redirect_fields(redirect_url: &str) -> [(String, String); 2] {
    [
        ("after_completion[type]".to_owned(), "redirect".to_owned()),
        (
            "after_completion[redirect][url]".to_owned(),
            redirect_url.to_owned(),
        ),
    ]
}

fn product_form(request: &PayableLinkRequest) -> FormFields {
    std::iter::once(("name".to_owned(), request.product_name.clone()))
        .chain(metadata_fields(&request.metadata))
        .collect()
}

fn price_form(request: &PayableLinkRequest, product_id: &str) -> FormFields {
    vec![
        ("currency".to_owned(), request.currency.clone()),
        (
            "unit_amount".to_owned(),
            request.amount_minor_units.to_string(),
        ),
        ("product".to_owned(), product_id.to_owned()),
    ]
}

fn payment_link_form(request: &PayableLinkRequest, price_id: &str) -> FormFields {
    [
        ("line_items[0][price]".to_owned(), price_id.to_owned()),
        ("line_items[0][quantity]".to_owned(), "1".to_owned()),
    ]
    .into_iter()
    .chain(metadata_fields(&request.metadata))
    .chain(redirect_fields(&request.redirect_url))
    .collect()
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_payable_link(
        &self,
        request: &PayableLinkRequest,
    ) -> Result<PaymentLink, PaymentGatewayError> {
        let product: ProductDto = self.post_form("v1/products", &product_form(request)).await?;
        let price: PriceDto = self
            .post_form("v1/prices", &price_form(request, &product.id))
            .await?;
        let link: PaymentLinkDto = self
            .post_form("v1/payment_links", &payment_link_form(request, &price.id))
            .await?;

        debug!(
            product_id = %product.id,
            price_id = %price.id,
            payment_link_id = %link.id,
            "created stripe payment link"
        );
        Ok(PaymentLink {
            id: link.id,
            url: link.url,
        })
    }

    async fn update_payable_link(
        &self,
        link_id: &str,
        metadata: &BTreeMap<String, String>,
        redirect_url: &str,
    ) -> Result<(), PaymentGatewayError> {
        let form: FormFields = metadata_fields(metadata)
            .chain(redirect_fields(redirect_url))
            .collect();
        self.send_form(&format!("v1/payment_links/{link_id}"), &form)
            .await
            .map(|_| ())
    }
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    if error.is_timeout() {
        PaymentGatewayError::timeout(error.to_string())
    } else {
        PaymentGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PaymentGatewayError::timeout(format!("status {}: {preview}", status.as_u16()))
        }
        _ if status.is_client_error() => PaymentGatewayError::rejected(status.as_u16(), preview),
        _ => PaymentGatewayError::transport(format!("status {}: {preview}", status.as_u16())),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
#[path = "payment_gateway_tests.rs"]
mod tests;

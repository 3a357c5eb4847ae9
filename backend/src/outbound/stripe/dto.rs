//! Response bodies returned by the Stripe REST API.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct ProductDto {
    pub(super) id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PriceDto {
    pub(super) id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PaymentLinkDto {
    pub(super) id: String,
    pub(super) url: String,
}

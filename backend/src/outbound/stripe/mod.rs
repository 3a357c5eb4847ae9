//! Stripe outbound adapters.
//!
//! A form-encoded REST client implementing the `PaymentGateway` port and a
//! verifier for the `Stripe-Signature` header implementing
//! `WebhookAuthenticator`.

mod dto;
mod payment_gateway;
mod webhook_verifier;

pub use payment_gateway::{DEFAULT_STRIPE_API_BASE, StripePaymentGateway};
pub use webhook_verifier::{DEFAULT_SIGNATURE_TOLERANCE, StripeWebhookVerifier};

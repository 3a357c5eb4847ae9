//! Driven port for authenticating payment-provider webhooks.

use super::define_port_error;

define_port_error! {
    /// Reasons a webhook delivery is refused.
    pub enum WebhookAuthError {
        /// The signature header is absent or malformed.
        MalformedHeader { message: String } => "malformed signature header: {message}",
        /// The signed timestamp is outside the tolerance window.
        StaleTimestamp => "signature timestamp outside tolerance",
        /// No signature matched the payload.
        SignatureMismatch => "signature does not match payload",
        /// No signing secret is configured.
        NotConfigured => "webhook signing secret is not configured",
    }
}

/// Checks that a webhook body was produced by the payment provider.
#[cfg_attr(test, mockall::automock)]
pub trait WebhookAuthenticator: Send + Sync {
    /// Verify `body` against the raw signature header value.
    fn verify(&self, signature_header: &str, body: &[u8]) -> Result<(), WebhookAuthError>;
}

/// Authenticator that refuses every delivery.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingWebhookAuthenticator;

impl WebhookAuthenticator for RejectingWebhookAuthenticator {
    fn verify(&self, _signature_header: &str, _body: &[u8]) -> Result<(), WebhookAuthError> {
        Err(WebhookAuthError::not_configured())
    }
}

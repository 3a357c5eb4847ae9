//! Verification of the `Stripe-Signature` webhook header.
//!
//! The header carries a unix timestamp and one or more `v1` signatures:
//! `t=1700000000,v1=<hex>,v1=<hex>`. Each signature is an HMAC-SHA256 of
//! `"{t}.{body}"` keyed with the endpoint secret.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use mockable::Clock;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::ports::{WebhookAuthError, WebhookAuthenticator};

type HmacSha256 = Hmac<Sha256>;

/// Largest accepted gap between the signed timestamp and now.
pub const DEFAULT_SIGNATURE_TOLERANCE: Duration = Duration::from_secs(300);

/// Authenticates webhook deliveries signed with a shared endpoint secret.
pub struct StripeWebhookVerifier {
    secret: Zeroizing<Vec<u8>>,
    tolerance: Duration,
    clock: Arc<dyn Clock>,
}

impl StripeWebhookVerifier {
    pub fn new(secret: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into().into_bytes()),
            tolerance: DEFAULT_SIGNATURE_TOLERANCE,
            clock,
        }
    }

    /// Override the timestamp tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn mac_for(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, WebhookAuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| WebhookAuthError::not_configured())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}

struct SignatureHeader<'a> {
    timestamp: &'a str,
    signatures: Vec<&'a str>,
}

fn parse_header(raw: &str) -> Result<SignatureHeader<'_>, WebhookAuthError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in raw.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| WebhookAuthError::malformed_header("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(WebhookAuthError::malformed_header("missing v1 signature"));
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

impl WebhookAuthenticator for StripeWebhookVerifier {
    fn verify(&self, signature_header: &str, body: &[u8]) -> Result<(), WebhookAuthError> {
        if self.secret.is_empty() {
            return Err(WebhookAuthError::not_configured());
        }
        let header = parse_header(signature_header)?;
        let signed_at: i64 = header
            .timestamp
            .parse()
            .map_err(|_| WebhookAuthError::malformed_header("timestamp is not an integer"))?;

        let age = self.clock.utc().timestamp().abs_diff(signed_at);
        if age > self.tolerance.as_secs() {
            return Err(WebhookAuthError::stale_timestamp());
        }

        let mac = self.mac_for(header.timestamp, body)?;
        let matched = header
            .signatures
            .iter()
            .filter_map(|candidate| hex::decode(candidate).ok())
            .any(|candidate| mac.clone().verify_slice(&candidate).is_ok());
        if matched {
            Ok(())
        } else {
            Err(WebhookAuthError::signature_mismatch())
        }
    }
}

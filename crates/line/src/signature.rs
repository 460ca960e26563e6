//! Webhook signature verification.
//!
//! LINE signs each delivery with base64(HMAC-SHA256(channel secret, body)) in
//! the `x-line-signature` header.

use crate::{LineError, LineResult, WebhookEvent, WebhookPayload};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use sha2::Sha256;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Authenticate a webhook delivery and decode its events.
pub trait WebhookVerifier: Send + Sync {
    /// Fails with [`LineError::Authentication`] when the signature does not
    /// match; any other error means the delivery could not be checked.
    fn verify_and_parse(&self, body: &[u8], headers: &HeaderMap) -> LineResult<Vec<WebhookEvent>>;
}

/// Verifier keyed by the channel secret.
#[derive(Clone)]
pub struct ChannelSecretVerifier {
    secret: Option<String>,
}

impl ChannelSecretVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Signature header value for `body`.
    pub fn sign(secret: &str, body: &[u8]) -> LineResult<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| LineError::Internal(format!("HMAC init failed: {}", e)))?;
        mac.update(body);
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn verify(&self, body: &[u8], headers: &HeaderMap) -> LineResult<()> {
        let secret = self
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LineError::Configuration("LINE_CHANNEL_SECRET not set".to_string()))?;

        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| LineError::Authentication("missing signature".to_string()))?;
        let expected = STANDARD
            .decode(signature)
            .map_err(|_| LineError::Authentication("invalid signature".to_string()))?;

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| LineError::Internal(format!("HMAC init failed: {}", e)))?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| LineError::Authentication("invalid signature".to_string()))
    }
}

impl WebhookVerifier for ChannelSecretVerifier {
    fn verify_and_parse(&self, body: &[u8], headers: &HeaderMap) -> LineResult<Vec<WebhookEvent>> {
        self.verify(body, headers)?;
        let payload: WebhookPayload =
            serde_json::from_slice(body).map_err(|e| LineError::Decode(e.to_string()))?;
        Ok(payload.events)
    }
}

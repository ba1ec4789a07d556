//! Inbound gateway webhooks
//!
//! The gateway signs the raw request body with HMAC-SHA512 keyed by the
//! secret key and sends the hex digest in the `x-paystack-signature` header.
//! Verification happens on the raw bytes, before any JSON parsing.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;

use core_kernel::BookingId;

use crate::error::PaymentError;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Checks webhook signatures against the shared secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// Creates a verifier keyed by the gateway secret
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Validation` for a blank secret, since anyone
    /// could then compute a valid signature.
    pub fn new(secret: impl Into<String>) -> Result<Self, PaymentError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(PaymentError::validation("webhook secret must not be empty"));
        }
        Ok(Self { secret })
    }

    /// Computes the hex signature of a body
    pub fn sign(&self, body: &[u8]) -> Result<String, PaymentError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verifies a signature header in constant time
    ///
    /// A missing header, a header that is not hex, and a wrong digest all
    /// fail with `PaymentError::InvalidSignature`.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), PaymentError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(PaymentError::InvalidSignature)?;
        let expected = hex::decode(signature).map_err(|_| PaymentError::InvalidSignature)?;

        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| PaymentError::InvalidSignature)
    }

    fn mac(&self) -> Result<HmacSha512, PaymentError> {
        HmacSha512::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::validation(format!("invalid webhook secret: {e}")))
    }
}

/// Webhook envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
    /// The full parsed body, kept for the event log
    #[serde(skip)]
    pub raw: serde_json::Value,
}

/// The `data` object of a webhook
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default, alias = "paidAt")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub transfer_code: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

impl WebhookEvent {
    /// Parses a verified body
    pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
        let raw: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| PaymentError::MalformedWebhook(e.to_string()))?;
        let mut event: WebhookEvent = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::MalformedWebhook(e.to_string()))?;
        event.raw = raw;
        Ok(event)
    }
}

impl WebhookData {
    /// The booking id carried in `metadata.bookingId`, if parseable
    ///
    /// Gateways sometimes deliver metadata as a JSON-encoded string.
    pub fn metadata_booking_id(&self) -> Option<BookingId> {
        let metadata = match self.metadata.as_ref()? {
            serde_json::Value::String(s) => serde_json::from_str(s).ok()?,
            other => other.clone(),
        };
        metadata
            .get("bookingId")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }

    /// Reference with surrounding whitespace removed, None if blank
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "sk_test_4f1c0a8b2e";

    #[test]
    fn test_valid_signature() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let body = br#"{"event":"charge.success","data":{"reference":"abc"}}"#;
        let sig = verifier.sign(body).unwrap();
        assert_eq!(sig.len(), 128);
        assert!(verifier.verify(body, Some(&sig)).is_ok());
    }

    #[test]
    fn test_signature_from_other_secret_fails() {
        let body = br#"{"event":"charge.success"}"#;
        let sig = WebhookVerifier::new("another").unwrap().sign(body).unwrap();
        let result = WebhookVerifier::new(SECRET).unwrap().verify(body, Some(&sig));
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_blank_secret_is_refused() {
        assert!(matches!(WebhookVerifier::new(""), Err(PaymentError::Validation(_))));
        assert!(matches!(WebhookVerifier::new("   "), Err(PaymentError::Validation(_))));
    }

    #[test]
    fn test_tampered_body_fails() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = verifier.sign(br#"{"amount":100}"#).unwrap();
        assert!(verifier.verify(br#"{"amount":900}"#, Some(&sig)).is_err());
    }

    #[test]
    fn test_missing_or_non_hex_header_fails() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        assert!(matches!(verifier.verify(b"{}", None), Err(PaymentError::InvalidSignature)));
        assert!(matches!(verifier.verify(b"{}", Some("")), Err(PaymentError::InvalidSignature)));
        assert!(matches!(
            verifier.verify(b"{}", Some("zz-not-hex")),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_parse_charge_success() {
        let booking_id = BookingId::new();
        let body = format!(
            r#"{{"event":"charge.success","data":{{"reference":"PAY-1","status":"success","amount":50000,"paid_at":"2024-05-01T10:00:00.000Z","metadata":{{"bookingId":"{}"}}}}}}"#,
            booking_id.as_uuid()
        );
        let event = WebhookEvent::parse(body.as_bytes()).unwrap();
        assert_eq!(event.event, "charge.success");
        assert_eq!(event.data.reference(), Some("PAY-1"));
        assert_eq!(event.data.amount, Some(50000));
        assert!(event.data.paid_at.is_some());
        assert_eq!(event.data.metadata_booking_id(), Some(booking_id));
        assert_eq!(event.raw["data"]["amount"], 50000);
    }

    #[test]
    fn test_metadata_as_encoded_string() {
        let booking_id = BookingId::new();
        let data = WebhookData {
            metadata: Some(serde_json::Value::String(format!(
                r#"{{"bookingId":"{}"}}"#,
                booking_id
            ))),
            ..Default::default()
        };
        assert_eq!(data.metadata_booking_id(), Some(booking_id));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            WebhookEvent::parse(b"not json"),
            Err(PaymentError::MalformedWebhook(_))
        ));
    }
}

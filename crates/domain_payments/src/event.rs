//! Append-only payment event log entries
//!
//! Events are unique on `(gateway, gateway_ref, event_type)`. Appending an
//! event that already exists is how redelivered webhooks are detected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{PaymentEventId, PaymentId};

/// Kind of ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentEventType {
    PaymentInitiated,
    WebhookSuccess,
    Verification,
    RefundRequest,
    RefundUpdate,
    PayoutRequest,
}

impl PaymentEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEventType::PaymentInitiated => "PAYMENT_INITIATED",
            PaymentEventType::WebhookSuccess => "WEBHOOK_SUCCESS",
            PaymentEventType::Verification => "VERIFICATION",
            PaymentEventType::RefundRequest => "REFUND_REQUEST",
            PaymentEventType::RefundUpdate => "REFUND_UPDATE",
            PaymentEventType::PayoutRequest => "PAYOUT_REQUEST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PAYMENT_INITIATED" => Some(PaymentEventType::PaymentInitiated),
            "WEBHOOK_SUCCESS" => Some(PaymentEventType::WebhookSuccess),
            "VERIFICATION" => Some(PaymentEventType::Verification),
            "REFUND_REQUEST" => Some(PaymentEventType::RefundRequest),
            "REFUND_UPDATE" => Some(PaymentEventType::RefundUpdate),
            "PAYOUT_REQUEST" => Some(PaymentEventType::PayoutRequest),
            _ => None,
        }
    }
}

/// A single ledger event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: PaymentEventId,
    /// None for payout events not tied to one payment
    pub payment_id: Option<PaymentId>,
    pub event_type: PaymentEventType,
    /// Gateway name, e.g. "paystack"
    pub gateway: String,
    pub gateway_ref: String,
    /// Raw gateway payload or request summary
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl PaymentEvent {
    pub fn new(
        payment_id: Option<PaymentId>,
        event_type: PaymentEventType,
        gateway: impl Into<String>,
        gateway_ref: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: PaymentEventId::new_v7(),
            payment_id,
            event_type,
            gateway: gateway.into(),
            gateway_ref: gateway_ref.into(),
            payload,
            created_at: Utc::now(),
        }
    }

    /// The uniqueness key of the event log
    pub fn dedupe_key(&self) -> (&str, &str, PaymentEventType) {
        (&self.gateway, &self.gateway_ref, self.event_type)
    }
}

//! Payment and refund DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use core_kernel::{PaymentId, RefundId};
use domain_payments::services::{InitiatedPayment, VerifiedPayment, WebhookOutcome};
use domain_payments::Refund;

#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    pub payment_id: PaymentId,
    pub authorization_url: String,
    pub reference: String,
}

impl From<InitiatedPayment> for InitiatePaymentResponse {
    fn from(p: InitiatedPayment) -> Self {
        Self {
            payment_id: p.payment_id,
            authorization_url: p.authorization_url,
            reference: p.reference,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub payment_id: PaymentId,
    pub status: &'static str,
    pub amount: Decimal,
    pub currency: &'static str,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<VerifiedPayment> for VerifyPaymentResponse {
    fn from(v: VerifiedPayment) -> Self {
        Self {
            payment_id: v.payment_id,
            status: v.status.as_str(),
            amount: v.amount.amount(),
            currency: v.amount.currency().code(),
            paid_at: v.paid_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub id: RefundId,
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub currency: &'static str,
    pub status: &'static str,
    pub gateway_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Refund> for RefundResponse {
    fn from(r: Refund) -> Self {
        Self {
            id: r.id,
            payment_id: r.payment_id,
            amount: r.amount.amount(),
            currency: r.amount.currency().code(),
            status: r.status.as_str(),
            gateway_reference: r.gateway_ref,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Acknowledgement returned to the gateway
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: &'static str,
}

impl From<WebhookOutcome> for WebhookAck {
    fn from(outcome: WebhookOutcome) -> Self {
        let outcome = match outcome {
            WebhookOutcome::Applied => "applied",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::Ignored => "ignored",
        };
        Self {
            received: true,
            outcome,
        }
    }
}

//! Payout DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{PaymentCardId, PaymentId, PayoutId, ProviderId};
use domain_payments::Payout;

use super::positive_amount;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePayoutRequest {
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    /// Defaults to the configured marketplace currency
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 255, message = "reason must be 1 to 255 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct PayoutResponse {
    pub id: PayoutId,
    pub provider_id: ProviderId,
    pub payment_card_id: PaymentCardId,
    pub amount: Decimal,
    pub currency: &'static str,
    pub reason: String,
    pub status: &'static str,
    pub transfer_code: Option<String>,
    pub reference: Option<String>,
    pub failure_reason: Option<String>,
    pub payment_ids: Vec<PaymentId>,
    pub created_at: DateTime<Utc>,
}

impl From<Payout> for PayoutResponse {
    fn from(p: Payout) -> Self {
        Self {
            id: p.id,
            provider_id: p.provider_id,
            payment_card_id: p.payment_card_id,
            amount: p.amount.amount(),
            currency: p.amount.currency().code(),
            reason: p.reason,
            status: p.status.as_str(),
            transfer_code: p.transfer_code,
            reference: p.reference,
            failure_reason: p.failure_reason,
            payment_ids: p.payment_ids,
            created_at: p.created_at,
        }
    }
}

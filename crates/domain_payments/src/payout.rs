//! Payouts to providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PaymentCardId, PaymentId, PayoutId, ProviderId};

/// Payout status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    /// Row written, gateway not yet called
    Pending,
    /// Transfer accepted by the gateway
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Processing => "PROCESSING",
            PayoutStatus::Completed => "COMPLETED",
            PayoutStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PayoutStatus::Pending),
            "PROCESSING" => Some(PayoutStatus::Processing),
            "COMPLETED" => Some(PayoutStatus::Completed),
            "FAILED" => Some(PayoutStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Completed | PayoutStatus::Failed)
    }
}

/// A transfer of money to a provider's default payment card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub provider_id: ProviderId,
    pub payment_card_id: PaymentCardId,
    pub amount: Money,
    pub reason: String,
    pub status: PayoutStatus,
    pub transfer_code: Option<String>,
    pub reference: Option<String>,
    pub failure_reason: Option<String>,
    /// Payments this payout settles (payout items)
    pub payment_ids: Vec<PaymentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    pub fn new(
        provider_id: ProviderId,
        payment_card_id: PaymentCardId,
        amount: Money,
        reason: impl Into<String>,
        payment_ids: Vec<PaymentId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PayoutId::new_v7(),
            provider_id,
            payment_card_id,
            amount,
            reason: reason.into(),
            status: PayoutStatus::Pending,
            transfer_code: None,
            reference: None,
            failure_reason: None,
            payment_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reference sent with the transfer request
    pub fn transfer_reference(&self) -> String {
        self.id.to_string()
    }

    pub fn mark_processing(&mut self, transfer_code: impl Into<String>, reference: impl Into<String>) {
        self.status = PayoutStatus::Processing;
        self.transfer_code = Some(transfer_code.into());
        self.reference = Some(reference.into());
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.status = PayoutStatus::Completed;
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = PayoutStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.updated_at = Utc::now();
    }
}

//! Refunds of booking payments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PaymentId, RefundId};

/// Refund status as tracked by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Initiated,
    Completed,
    Failed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Initiated => "INITIATED",
            RefundStatus::Completed => "COMPLETED",
            RefundStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INITIATED" => Some(RefundStatus::Initiated),
            "COMPLETED" => Some(RefundStatus::Completed),
            "FAILED" => Some(RefundStatus::Failed),
            _ => None,
        }
    }

    /// Maps a gateway refund status string onto the ledger status
    ///
    /// Unknown strings stay INITIATED so the poller keeps asking.
    pub fn from_gateway(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "success" | "processed" => RefundStatus::Completed,
            "failed" | "reversed" => RefundStatus::Failed,
            // pending, processing, needs-attention
            _ => RefundStatus::Initiated,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RefundStatus::Initiated)
    }
}

/// A refund request against a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: RefundId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub gateway: String,
    /// The gateway's refund reference
    pub gateway_ref: String,
    pub status: RefundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    pub fn new(
        payment_id: PaymentId,
        amount: Money,
        gateway: impl Into<String>,
        gateway_ref: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RefundId::new_v7(),
            payment_id,
            amount,
            gateway: gateway.into(),
            gateway_ref: gateway_ref.into(),
            status: RefundStatus::Initiated,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_status_mapping() {
        assert_eq!(RefundStatus::from_gateway("pending"), RefundStatus::Initiated);
        assert_eq!(RefundStatus::from_gateway("processing"), RefundStatus::Initiated);
        assert_eq!(RefundStatus::from_gateway("needs-attention"), RefundStatus::Initiated);
        assert_eq!(RefundStatus::from_gateway("processed"), RefundStatus::Completed);
        assert_eq!(RefundStatus::from_gateway("Success"), RefundStatus::Completed);
        assert_eq!(RefundStatus::from_gateway("failed"), RefundStatus::Failed);
        assert_eq!(RefundStatus::from_gateway("reversed"), RefundStatus::Failed);
    }

    #[test]
    fn test_unknown_gateway_status_keeps_polling() {
        let status = RefundStatus::from_gateway("queued-for-review");
        assert_eq!(status, RefundStatus::Initiated);
        assert!(!status.is_terminal());
    }
}

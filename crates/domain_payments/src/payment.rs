//! Booking payments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BookingId, CustomerId, Money, PaymentId, ProviderId};
use domain_marketplace::BookingPaymentStatus;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Checkout started, no confirmation yet
    Pending,
    /// Confirmed by webhook or verification
    Paid,
    /// Verification reported a non-success outcome
    Failed,
    /// Refund confirmed by the gateway
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "FAILED" => Some(PaymentStatus::Failed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    /// The status written onto the booking alongside this one
    pub fn booking_status(&self) -> BookingPaymentStatus {
        match self {
            PaymentStatus::Pending => BookingPaymentStatus::Pending,
            PaymentStatus::Paid => BookingPaymentStatus::Paid,
            PaymentStatus::Failed => BookingPaymentStatus::Failed,
            PaymentStatus::Refunded => BookingPaymentStatus::Refunded,
        }
    }
}

/// A customer payment for a booking
///
/// One row per booking. Re-initiating checkout reuses the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub provider_id: ProviderId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub status: PaymentStatus,
    /// Reference the gateway knows the transaction by
    pub gateway_reference: Option<String>,
    /// Gateway refund reference; set once a refund was requested
    pub refund_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment for a booking
    pub fn new(
        booking_id: BookingId,
        provider_id: ProviderId,
        customer_id: CustomerId,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new_v7(),
            booking_id,
            provider_id,
            customer_id,
            amount,
            status: PaymentStatus::Pending,
            gateway_reference: None,
            refund_reference: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The reference sent to the gateway on checkout
    pub fn checkout_reference(&self) -> String {
        self.id.to_string()
    }

    /// PAID and REFUNDED payments cannot be checked out again
    pub fn is_settled(&self) -> bool {
        matches!(self.status, PaymentStatus::Paid | PaymentStatus::Refunded)
    }

    pub fn mark_paid(&mut self, paid_at: DateTime<Utc>) {
        self.status = PaymentStatus::Paid;
        self.paid_at = Some(paid_at);
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self) {
        self.status = PaymentStatus::Failed;
        self.updated_at = Utc::now();
    }

    pub fn mark_refunded(&mut self) {
        self.status = PaymentStatus::Refunded;
        self.updated_at = Utc::now();
    }

    pub fn record_refund_reference(&mut self, reference: impl Into<String>) {
        self.refund_reference = Some(reference.into());
        self.updated_at = Utc::now();
    }
}

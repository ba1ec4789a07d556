//! Booking aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BookingId, CustomerId, Money, ProviderId};
use crate::error::MarketplaceError;

/// Operational status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Requested by the customer, no provider yet
    Pending,
    /// A provider accepted the quote
    Accepted,
    /// The move is underway
    InProgress,
    /// The provider finished the move
    Completed,
    /// Cancelled by either side
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Accepted => "ACCEPTED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "ACCEPTED" => Some(BookingStatus::Accepted),
            "IN_PROGRESS" => Some(BookingStatus::InProgress),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// Payment status mirrored onto the booking
///
/// Written alongside `Payment.status` by every payment mutation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl BookingPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingPaymentStatus::Pending => "PENDING",
            BookingPaymentStatus::Paid => "PAID",
            BookingPaymentStatus::Failed => "FAILED",
            BookingPaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingPaymentStatus::Pending),
            "PAID" => Some(BookingPaymentStatus::Paid),
            "FAILED" => Some(BookingPaymentStatus::Failed),
            "REFUNDED" => Some(BookingPaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// A move booked by a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    /// Set once a provider accepts the booking
    pub provider_id: Option<ProviderId>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub distance_km: Decimal,
    /// Total the customer is charged
    pub quoted_total: Money,
    pub status: BookingStatus,
    pub payment_status: BookingPaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new pending booking
    pub fn new(
        customer_id: CustomerId,
        pickup_address: impl Into<String>,
        dropoff_address: impl Into<String>,
        distance_km: Decimal,
        quoted_total: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new_v7(),
            customer_id,
            provider_id: None,
            pickup_address: pickup_address.into(),
            dropoff_address: dropoff_address.into(),
            distance_km,
            quoted_total,
            status: BookingStatus::Pending,
            payment_status: BookingPaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the assigned provider or an error when the booking is unassigned
    pub fn assigned_provider(&self) -> Result<ProviderId, MarketplaceError> {
        self.provider_id.ok_or(MarketplaceError::NoAssignedProvider)
    }

    /// Assigns a provider and moves the booking to ACCEPTED
    pub fn accept(&mut self, provider_id: ProviderId) -> Result<(), MarketplaceError> {
        self.transition(BookingStatus::Accepted)?;
        self.provider_id = Some(provider_id);
        Ok(())
    }

    /// Marks the move as started
    pub fn start(&mut self) -> Result<(), MarketplaceError> {
        self.transition(BookingStatus::InProgress)
    }

    /// Marks the move as finished by the provider
    pub fn complete(&mut self) -> Result<(), MarketplaceError> {
        self.transition(BookingStatus::Completed)
    }

    /// Cancels the booking
    pub fn cancel(&mut self) -> Result<(), MarketplaceError> {
        self.transition(BookingStatus::Cancelled)
    }

    /// Checks whether the status can move to `next`
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self.status, next),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, InProgress)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    fn transition(&mut self, next: BookingStatus) -> Result<(), MarketplaceError> {
        if !self.can_transition_to(next) {
            return Err(MarketplaceError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

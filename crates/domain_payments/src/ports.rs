//! Payments Ledger Ports
//!
//! Storage ports for the payment ledger. Every orchestrator receives these
//! as `Arc<dyn ...>` handles:
//!
//! - **Internal Adapter**: PostgreSQL (infra_db)
//! - **In-memory Adapter**: For orchestrator tests (test_utils)
//!
//! All methods return `Result<T, PortError>`. Uniqueness violations surface
//! as `PortError::Conflict`, missing rows as `PortError::NotFound`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{
    BookingId, DomainPort, PaymentCardId, PaymentId, PayoutId, PortError, ProviderId, RefundId,
};

use crate::card::PaymentCard;
use crate::event::PaymentEvent;
use crate::payment::Payment;
use crate::payout::Payout;
use crate::refund::{Refund, RefundStatus};

/// Storage for payments
#[async_trait]
pub trait PaymentLedger: DomainPort {
    /// Inserts a new payment
    ///
    /// # Returns
    ///
    /// `PortError::Conflict` if the booking already has a payment
    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Retrieves a payment by ID
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    /// Finds the payment for a booking, if one exists
    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, PortError>;

    /// Finds a payment by the reference the gateway knows it by
    async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>, PortError>;

    /// Overwrites the mutable fields of a payment
    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Lists a provider's PAID payments since `since` that no live payout settles
    ///
    /// A payout is live unless it FAILED.
    async fn list_unsettled_paid(
        &self,
        provider_id: ProviderId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Payment>, PortError>;
}

/// Append-only event log
#[async_trait]
pub trait EventLog: DomainPort {
    /// Appends an event
    ///
    /// # Returns
    ///
    /// `true` if the event was recorded, `false` if an event with the same
    /// `(gateway, gateway_ref, event_type)` already exists
    async fn append(&self, event: &PaymentEvent) -> Result<bool, PortError>;

    /// Lists the events of a payment, oldest first
    async fn list_for_payment(&self, payment_id: PaymentId) -> Result<Vec<PaymentEvent>, PortError>;
}

/// Storage for refunds
#[async_trait]
pub trait RefundLedger: DomainPort {
    async fn insert_refund(&self, refund: &Refund) -> Result<(), PortError>;

    async fn get_refund(&self, id: RefundId) -> Result<Refund, PortError>;

    /// Returns the most recently created refund for a payment
    async fn latest_for_payment(&self, payment_id: PaymentId) -> Result<Option<Refund>, PortError>;

    async fn update_status(&self, id: RefundId, status: RefundStatus) -> Result<(), PortError>;
}

/// Storage for payouts and their payout items
#[async_trait]
pub trait PayoutLedger: DomainPort {
    /// Inserts a payout together with its payout items
    async fn insert_payout(&self, payout: &Payout) -> Result<(), PortError>;

    async fn get_payout(&self, id: PayoutId) -> Result<Payout, PortError>;

    /// Overwrites status, transfer code, reference and failure reason
    async fn update_payout(&self, payout: &Payout) -> Result<(), PortError>;

    /// Finds a payout by its transfer reference
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payout>, PortError>;

    /// Finds a payout by the gateway transfer code
    async fn find_by_transfer_code(&self, transfer_code: &str) -> Result<Option<Payout>, PortError>;

    /// Returns true if a PENDING, PROCESSING or COMPLETED payout settles the payment
    async fn is_payment_settled(&self, payment_id: PaymentId) -> Result<bool, PortError>;

    async fn list_for_provider(&self, provider_id: ProviderId) -> Result<Vec<Payout>, PortError>;
}

/// Storage for provider payment cards
#[async_trait]
pub trait CardStore: DomainPort {
    async fn insert_card(&self, card: &PaymentCard) -> Result<(), PortError>;

    async fn list_cards(&self, provider_id: ProviderId) -> Result<Vec<PaymentCard>, PortError>;

    /// Returns the provider's default card, if any
    async fn get_default(&self, provider_id: ProviderId) -> Result<Option<PaymentCard>, PortError>;

    /// Makes `card_id` the provider's only default card in one operation
    ///
    /// # Returns
    ///
    /// The updated card, or `PortError::NotFound` if the card does not
    /// belong to the provider
    async fn set_default(
        &self,
        provider_id: ProviderId,
        card_id: PaymentCardId,
    ) -> Result<PaymentCard, PortError>;
}

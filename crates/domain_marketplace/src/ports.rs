//! Marketplace Domain Ports
//!
//! The payments core does not own bookings, providers or customers. It reads
//! them, and writes back a narrow set of fields, through these ports:
//!
//! - **Internal Adapter**: PostgreSQL tables shared with the marketplace (infra_db)
//! - **In-memory Adapter**: For orchestrator tests (test_utils)
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_marketplace::ports::BookingPort;
//! use std::sync::Arc;
//!
//! pub struct PaymentService {
//!     bookings: Arc<dyn BookingPort>,
//! }
//!
//! impl PaymentService {
//!     pub async fn mark_paid(&self, id: BookingId) -> Result<(), PortError> {
//!         self.bookings.set_payment_status(id, BookingPaymentStatus::Paid).await
//!     }
//! }
//! ```

use async_trait::async_trait;

use core_kernel::{BookingId, CustomerId, DomainPort, Money, PortError, ProviderId};

use crate::booking::{Booking, BookingPaymentStatus, BookingStatus};
use crate::customer::Customer;
use crate::provider::Provider;

/// Read and narrow-write access to bookings
#[async_trait]
pub trait BookingPort: DomainPort {
    /// Retrieves a booking by ID
    ///
    /// # Returns
    ///
    /// The booking if found, or `PortError::NotFound`
    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError>;

    /// Writes the payment status mirrored on the booking
    ///
    /// # Arguments
    ///
    /// * `id` - The booking identifier
    /// * `status` - The new payment status
    async fn set_payment_status(
        &self,
        id: BookingId,
        status: BookingPaymentStatus,
    ) -> Result<(), PortError>;

    /// Writes the operational status of the booking
    async fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<(), PortError>;
}

/// Access to provider records
#[async_trait]
pub trait ProviderPort: DomainPort {
    /// Retrieves a provider by ID
    ///
    /// # Returns
    ///
    /// The provider if found, or `PortError::NotFound`
    async fn get_provider(&self, id: ProviderId) -> Result<Provider, PortError>;

    /// Lists every provider in APPROVED status
    async fn list_approved(&self) -> Result<Vec<Provider>, PortError>;

    /// Increments the provider's earnings by `amount`
    ///
    /// Called only after a payout was accepted by the gateway.
    async fn add_earnings(&self, id: ProviderId, amount: Money) -> Result<(), PortError>;
}

/// Read-only access to customers
#[async_trait]
pub trait CustomerPort: DomainPort {
    /// Retrieves a customer by ID
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError>;
}

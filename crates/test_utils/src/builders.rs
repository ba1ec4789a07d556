//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! Names and emails are generated with `fake` so unrelated tests never share
//! identities by accident.

use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, Money, ProviderId};
use domain_marketplace::{
    Booking, BookingPaymentStatus, BookingStatus, Customer, Provider, ProviderStatus,
};

use crate::fixtures::MoneyFixtures;

/// Builder for test bookings
pub struct TestBookingBuilder {
    customer_id: CustomerId,
    provider_id: Option<ProviderId>,
    distance_km: Decimal,
    quoted_total: Money,
    status: BookingStatus,
    payment_status: BookingPaymentStatus,
}

impl TestBookingBuilder {
    /// Creates a builder for an accepted 500.00 NGN booking
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            provider_id: None,
            distance_km: dec!(12.5),
            quoted_total: MoneyFixtures::ngn_500(),
            status: BookingStatus::Pending,
            payment_status: BookingPaymentStatus::Pending,
        }
    }

    /// Assigns a provider and moves the booking to ACCEPTED
    pub fn with_provider(mut self, provider_id: ProviderId) -> Self {
        self.provider_id = Some(provider_id);
        self.status = BookingStatus::Accepted;
        self
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.quoted_total = total;
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Booking {
        let mut booking = Booking::new(
            self.customer_id,
            "14 Adeola Odeku Street, Victoria Island",
            "3 Aminu Kano Crescent, Wuse II",
            self.distance_km,
            self.quoted_total,
        );
        booking.provider_id = self.provider_id;
        booking.status = self.status;
        booking.payment_status = self.payment_status;
        booking
    }
}

/// Builder for test providers
pub struct TestProviderBuilder {
    status: ProviderStatus,
    currency: Currency,
}

impl Default for TestProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProviderBuilder {
    /// Creates a builder for an approved NGN provider
    pub fn new() -> Self {
        Self {
            status: ProviderStatus::Approved,
            currency: Currency::NGN,
        }
    }

    pub fn with_status(mut self, status: ProviderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Provider {
        let name: String = CompanyName().fake();
        let email: String = SafeEmail().fake();
        let mut provider = Provider::new(name, email, self.currency);
        provider.status = self.status;
        provider
    }
}

/// Creates a customer with generated contact details
pub fn test_customer() -> Customer {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    let phone: String = PhoneNumber().fake();
    Customer::new(name, email, Some(phone))
}

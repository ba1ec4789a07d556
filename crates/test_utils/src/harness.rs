//! Orchestrator Test Harness
//!
//! Builds every payments orchestrator over the in-memory adapters and the
//! fake gateway, plus seeding helpers for the common starting states.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use core_kernel::Money;
use domain_marketplace::{Booking, BookingPaymentStatus, BookingPort, Customer, Provider};
use domain_payments::services::{
    CardService, LedgerPorts, MarketplacePorts, PaymentService, PayoutPolicy, PayoutService,
    RefundPoller, RefundService,
};
use domain_payments::{NewCard, Payment, PaymentCard, PaymentLedger, RetryPolicy, WebhookVerifier};

use crate::builders::{test_customer, TestBookingBuilder, TestProviderBuilder};
use crate::fakes::{FakeGateway, RecordingNotifier};
use crate::fixtures::{BankFixtures, WEBHOOK_SECRET};
use crate::memory::{InMemoryLedger, InMemoryMarketplace};

/// A customer, an approved provider and an accepted booking between them
pub struct SeededBooking {
    pub customer: Customer,
    pub provider: Provider,
    pub booking: Booking,
}

/// In-memory wiring of the payments core
pub struct TestHarness {
    pub ledger: Arc<InMemoryLedger>,
    pub marketplace: Arc<InMemoryMarketplace>,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub retry: RetryPolicy,
    pub payout_policy: PayoutPolicy,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(InMemoryLedger::new()),
            marketplace: Arc::new(InMemoryMarketplace::new()),
            gateway: Arc::new(FakeGateway::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            retry: RetryPolicy::default(),
            payout_policy: PayoutPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_payout_policy(mut self, policy: PayoutPolicy) -> Self {
        self.payout_policy = policy;
        self
    }

    pub fn ledger_ports(&self) -> LedgerPorts {
        LedgerPorts {
            payments: self.ledger.clone(),
            events: self.ledger.clone(),
            refunds: self.ledger.clone(),
            payouts: self.ledger.clone(),
            cards: self.ledger.clone(),
            refund_queue: self.ledger.clone(),
        }
    }

    pub fn marketplace_ports(&self) -> MarketplacePorts {
        MarketplacePorts {
            bookings: self.marketplace.clone(),
            providers: self.marketplace.clone(),
            customers: self.marketplace.clone(),
        }
    }

    pub fn payment_service(&self) -> PaymentService {
        PaymentService::new(
            self.ledger_ports(),
            self.marketplace_ports(),
            self.gateway.clone(),
            self.notifier.clone(),
            WebhookVerifier::new(WEBHOOK_SECRET).expect("harness secret is not blank"),
        )
        .with_callback_url("https://movers.test/payments/callback")
    }

    pub fn payout_service(&self) -> PayoutService {
        PayoutService::new(
            self.ledger_ports(),
            self.marketplace_ports(),
            self.gateway.clone(),
            self.payout_policy,
        )
    }

    pub fn refund_service(&self) -> RefundService {
        RefundService::new(self.ledger_ports(), self.gateway.clone(), self.retry)
    }

    pub fn refund_poller(&self) -> RefundPoller {
        RefundPoller::new(
            self.ledger_ports(),
            self.marketplace_ports(),
            self.gateway.clone(),
            self.notifier.clone(),
            self.retry,
        )
    }

    pub fn card_service(&self) -> CardService {
        CardService::new(self.ledger_ports(), self.marketplace_ports(), self.gateway.clone())
    }

    /// Signs a webhook body with the harness secret
    pub fn sign(&self, body: &[u8]) -> String {
        WebhookVerifier::new(WEBHOOK_SECRET)
            .and_then(|verifier| verifier.sign(body))
            .expect("HMAC accepts any key length")
    }

    /// Seeds an approved provider
    pub async fn seed_provider(&self) -> Provider {
        let provider = TestProviderBuilder::new().build();
        self.marketplace.insert_provider(provider.clone()).await;
        provider
    }

    /// Seeds a customer, an approved provider and an accepted booking
    pub async fn seed_booking(&self, total: Money) -> SeededBooking {
        let customer = test_customer();
        let provider = self.seed_provider().await;
        let booking = TestBookingBuilder::new(customer.id)
            .with_provider(provider.id)
            .with_total(total)
            .build();
        self.marketplace.insert_customer(customer.clone()).await;
        self.marketplace.insert_booking(booking.clone()).await;
        SeededBooking {
            customer,
            provider,
            booking,
        }
    }

    /// Seeds a booking for an existing provider
    pub async fn seed_booking_for(&self, provider: &Provider, total: Money) -> Booking {
        let customer = test_customer();
        let booking = TestBookingBuilder::new(customer.id)
            .with_provider(provider.id)
            .with_total(total)
            .build();
        self.marketplace.insert_customer(customer).await;
        self.marketplace.insert_booking(booking.clone()).await;
        booking
    }

    /// Writes a PAID payment for a booking directly into the ledger
    pub async fn seed_paid_payment(&self, booking: &Booking, paid_at: DateTime<Utc>) -> Payment {
        let provider_id = booking.provider_id.expect("seeded booking has a provider");
        let mut payment =
            Payment::new(booking.id, provider_id, booking.customer_id, booking.quoted_total);
        payment.gateway_reference = Some(payment.checkout_reference());
        payment.mark_paid(paid_at);
        self.ledger
            .insert_payment(&payment)
            .await
            .expect("insert seeded payment");
        self.marketplace
            .set_payment_status(booking.id, BookingPaymentStatus::Paid)
            .await
            .expect("mark seeded booking paid");
        payment
    }

    /// Adds a default payout card for a provider through the card service
    pub async fn seed_default_card(&self, provider: &Provider) -> PaymentCard {
        self.card_service()
            .add_card(
                provider.id,
                NewCard {
                    account_number: BankFixtures::account_number().to_string(),
                    account_name: provider.business_name.clone(),
                    bank_code: BankFixtures::bank_code().to_string(),
                    make_default: true,
                },
            )
            .await
            .expect("seed default card")
    }
}

//! PostgreSQL adapter tests
//!
//! Each test starts its own PostgreSQL container. They need Docker:
//!
//! ```text
//! cargo test -p infra_db -- --ignored
//! ```

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sqlx::PgPool;

use core_kernel::{Money, PaymentCardId, PaymentId, ProviderId};
use domain_marketplace::{
    Booking, BookingPaymentStatus, BookingPort, BookingStatus, Provider, ProviderPort,
};
use domain_payments::{
    CardStore, EventLog, JobStatus, NewCard, Payment, PaymentCard, PaymentEvent,
    PaymentEventType, PaymentLedger, PaymentStatus, Payout, PayoutLedger, PayoutStatus, Refund,
    RefundLedger, RefundPollJob, RefundQueue,
};
use infra_db::{PostgresLedger, PostgresMarketplace, PostgresRefundQueue};
use test_utils::database::create_isolated_test_database;
use test_utils::{test_customer, BankFixtures, MoneyFixtures, TestBookingBuilder, TestProviderBuilder};

// ============================================================================
// Seeding
// ============================================================================

async fn insert_provider(pool: &PgPool, provider: &Provider) {
    sqlx::query(
        "INSERT INTO providers (id, business_name, email, status, earnings, currency, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(provider.id.as_uuid())
    .bind(&provider.business_name)
    .bind(&provider.email)
    .bind(provider.status.as_str())
    .bind(provider.earnings.amount())
    .bind(provider.earnings.currency().code())
    .bind(provider.created_at)
    .execute(pool)
    .await
    .unwrap();
}

/// Inserts a customer, an approved provider and an accepted booking
async fn seed_booking(pool: &PgPool) -> (Provider, Booking) {
    let customer = test_customer();
    sqlx::query("INSERT INTO customers (id, full_name, email, phone) VALUES ($1, $2, $3, $4)")
        .bind(customer.id.as_uuid())
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .execute(pool)
        .await
        .unwrap();

    let provider = TestProviderBuilder::new().build();
    insert_provider(pool, &provider).await;

    let booking = TestBookingBuilder::new(customer.id)
        .with_provider(provider.id)
        .with_total(MoneyFixtures::ngn_500())
        .build();
    sqlx::query(
        "INSERT INTO bookings (id, customer_id, provider_id, pickup_address, dropoff_address,
                               distance_km, quoted_total, currency, status, payment_status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(booking.id.as_uuid())
    .bind(booking.customer_id.as_uuid())
    .bind(booking.provider_id.map(|id| *id.as_uuid()))
    .bind(&booking.pickup_address)
    .bind(&booking.dropoff_address)
    .bind(booking.distance_km)
    .bind(booking.quoted_total.amount())
    .bind(booking.quoted_total.currency().code())
    .bind(booking.status.as_str())
    .bind(booking.payment_status.as_str())
    .execute(pool)
    .await
    .unwrap();

    (provider, booking)
}

async fn paid_payment(ledger: &PostgresLedger, booking: &Booking, provider: ProviderId) -> Payment {
    let mut payment = Payment::new(booking.id, provider, booking.customer_id, booking.quoted_total.clone());
    payment.gateway_reference = Some(payment.checkout_reference());
    payment.mark_paid(Utc::now() - Duration::days(1));
    ledger.insert_payment(&payment).await.unwrap();
    payment
}

fn new_card(account_number: &str) -> NewCard {
    NewCard {
        account_number: account_number.to_string(),
        account_name: "Haul Masters Ltd".to_string(),
        bank_code: BankFixtures::bank_code().to_string(),
        make_default: false,
    }
}

// ============================================================================
// Payments and events
// ============================================================================

mod payments {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_payment_round_trip_and_booking_uniqueness() {
        let db = create_isolated_test_database().await.unwrap();
        let ledger = PostgresLedger::new(db.pool().clone());
        let (provider, booking) = seed_booking(db.pool()).await;

        let payment = paid_payment(&ledger, &booking, provider.id).await;

        let loaded = ledger.get_payment(payment.id).await.unwrap();
        assert_eq!(loaded.status, PaymentStatus::Paid);
        assert_eq!(loaded.amount, payment.amount);
        let by_ref = ledger
            .find_by_gateway_reference(&payment.checkout_reference())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_ref.id, payment.id);

        let duplicate = Payment::new(booking.id, provider.id, booking.customer_id, MoneyFixtures::ngn_500());
        let err = ledger.insert_payment(&duplicate).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_unknown_payment_is_not_found() {
        let db = create_isolated_test_database().await.unwrap();
        let ledger = PostgresLedger::new(db.pool().clone());

        let err = ledger.get_payment(PaymentId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_event_append_is_deduplicated_per_type() {
        let db = create_isolated_test_database().await.unwrap();
        let ledger = PostgresLedger::new(db.pool().clone());
        let (provider, booking) = seed_booking(db.pool()).await;
        let payment = paid_payment(&ledger, &booking, provider.id).await;

        let event = |event_type| {
            PaymentEvent::new(Some(payment.id), event_type, "paystack", "MOV_ref", serde_json::json!({}))
        };

        assert!(ledger.append(&event(PaymentEventType::WebhookSuccess)).await.unwrap());
        assert!(!ledger.append(&event(PaymentEventType::WebhookSuccess)).await.unwrap());
        assert!(ledger.append(&event(PaymentEventType::RefundRequest)).await.unwrap());

        let events = ledger.list_for_payment(payment.id).await.unwrap();
        assert_eq!(events.len(), 2);
    }
}

// ============================================================================
// Cards and payouts
// ============================================================================

mod payouts {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_set_default_leaves_exactly_one_default() {
        let db = create_isolated_test_database().await.unwrap();
        let ledger = PostgresLedger::new(db.pool().clone());
        let (provider, _) = seed_booking(db.pool()).await;

        let first = PaymentCard::from_recipient(provider.id, &new_card(BankFixtures::account_number()), "RCP_1");
        let second =
            PaymentCard::from_recipient(provider.id, &new_card(BankFixtures::second_account_number()), "RCP_2");
        ledger.insert_card(&first).await.unwrap();
        ledger.insert_card(&second).await.unwrap();

        ledger.set_default(provider.id, first.id).await.unwrap();
        let updated = ledger.set_default(provider.id, second.id).await.unwrap();
        assert!(updated.is_default);

        let defaults: Vec<_> = ledger
            .list_cards(provider.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);

        let err = ledger.set_default(ProviderId::new(), first.id).await.unwrap_err();
        assert!(err.is_not_found());
        let err = ledger.set_default(provider.id, PaymentCardId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_failed_payout_releases_its_payments() {
        let db = create_isolated_test_database().await.unwrap();
        let ledger = PostgresLedger::new(db.pool().clone());
        let (provider, booking) = seed_booking(db.pool()).await;
        let payment = paid_payment(&ledger, &booking, provider.id).await;
        let card = PaymentCard::from_recipient(provider.id, &new_card(BankFixtures::account_number()), "RCP_1");
        ledger.insert_card(&card).await.unwrap();

        let mut payout = Payout::new(
            provider.id,
            card.id,
            Money::new(dec!(450), payment.amount.currency()),
            "Weekly payout (1 bookings)",
            vec![payment.id],
        );
        ledger.insert_payout(&payout).await.unwrap();

        assert!(ledger.is_payment_settled(payment.id).await.unwrap());
        let since = Utc::now() - Duration::days(7);
        assert!(ledger.list_unsettled_paid(provider.id, since).await.unwrap().is_empty());

        let by_id = ledger
            .find_by_reference(&payout.transfer_reference())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.payment_ids, vec![payment.id]);

        payout.mark_failed("Account closed");
        ledger.update_payout(&payout).await.unwrap();

        let stored = ledger.get_payout(payout.id).await.unwrap();
        assert_eq!(stored.status, PayoutStatus::Failed);
        assert_eq!(stored.failure_reason.as_deref(), Some("Account closed"));
        assert!(!ledger.is_payment_settled(payment.id).await.unwrap());
        assert_eq!(ledger.list_unsettled_paid(provider.id, since).await.unwrap().len(), 1);
    }
}

// ============================================================================
// Refund queue
// ============================================================================

mod queue {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_claim_hides_job_until_lease_expires() {
        let db = create_isolated_test_database().await.unwrap();
        let ledger = PostgresLedger::new(db.pool().clone());
        let queue = PostgresRefundQueue::new(db.pool().clone()).with_lease(Duration::seconds(300));
        let (provider, booking) = seed_booking(db.pool()).await;
        let payment = paid_payment(&ledger, &booking, provider.id).await;

        let refund = Refund::new(payment.id, payment.amount.clone(), "paystack", "RF_1");
        ledger.insert_refund(&refund).await.unwrap();
        let now = Utc::now();
        let job = RefundPollJob::new(refund.id, payment.id, "RF_1", now);
        queue.enqueue(&job).await.unwrap();

        let claimed = queue.claim_due(now, 10).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert!(queue.claim_due(now, 10).await.unwrap().is_empty());
        assert_eq!(queue.claim_due(now + Duration::seconds(301), 10).await.unwrap().len(), 1);

        queue
            .reschedule(job.id, 1, now + Duration::seconds(60), Some("pending".into()))
            .await
            .unwrap();
        queue.mark_stuck(job.id, 2, "gave up".into()).await.unwrap();

        let stuck = queue.list_stuck(10).await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].status, JobStatus::Stuck);
        assert_eq!(stuck[0].attempts, 2);
        assert_eq!(stuck[0].last_error.as_deref(), Some("gave up"));
        assert!(queue.claim_due(now + Duration::days(1), 10).await.unwrap().is_empty());

        let latest = ledger.latest_for_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(latest.id, refund.id);
    }
}

// ============================================================================
// Marketplace tables
// ============================================================================

mod marketplace {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_booking_status_writes_and_earnings() {
        let db = create_isolated_test_database().await.unwrap();
        let marketplace = PostgresMarketplace::new(db.pool().clone());
        let (provider, booking) = seed_booking(db.pool()).await;

        marketplace
            .set_payment_status(booking.id, BookingPaymentStatus::Paid)
            .await
            .unwrap();
        marketplace.set_status(booking.id, BookingStatus::Completed).await.unwrap();
        let stored = marketplace.get_booking(booking.id).await.unwrap();
        assert_eq!(stored.payment_status, BookingPaymentStatus::Paid);
        assert_eq!(stored.status, BookingStatus::Completed);

        marketplace
            .add_earnings(provider.id, MoneyFixtures::ngn_450())
            .await
            .unwrap();
        marketplace
            .add_earnings(provider.id, MoneyFixtures::ngn_450())
            .await
            .unwrap();
        let stored = marketplace.get_provider(provider.id).await.unwrap();
        assert_eq!(stored.earnings.amount(), dec!(900));

        let approved = marketplace.list_approved().await.unwrap();
        assert_eq!(approved.len(), 1);

        let err = marketplace
            .add_earnings(ProviderId::new(), MoneyFixtures::ngn_450())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

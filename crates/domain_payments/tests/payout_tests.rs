//! Payout and Payment Card Tests
//!
//! # Test Organization
//!
//! - `single_payout` - admin payouts and gateway outcomes
//! - `booking_completion` - completion payout net of the platform fee
//! - `weekly_batch` - batch isolation and double-pay protection
//! - `cards` - default card handling
//! - `fee_properties` - property-based checks of the fee split

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{BookingId, Currency, Money, PaymentCardId, ProviderId};
use domain_marketplace::{BookingStatus, ProviderStatus};
use domain_payments::services::PayoutPolicy;
use domain_payments::{NewCard, PaymentError, PaymentEventType, PayoutStatus};
use test_utils::{
    assert_decimal_approx_eq, assert_event_count, assert_money_eq, assert_money_positive,
    ngn_booking_total_strategy, positive_money_strategy, BankFixtures, GatewayCalls,
    MoneyFixtures, TemporalFixtures, TestHarness, TestProviderBuilder,
};

fn card_details(account_number: &str, make_default: bool) -> NewCard {
    NewCard {
        account_number: account_number.to_string(),
        account_name: "Lagos Haulage Co".to_string(),
        bank_code: BankFixtures::bank_code().to_string(),
        make_default,
    }
}

// ============================================================================
// SINGLE PAYOUT
// ============================================================================

mod single_payout {
    use super::*;

    #[tokio::test]
    async fn test_payout_without_default_card_is_rejected() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;

        let err = h
            .payout_service()
            .create_payout(provider.id, MoneyFixtures::ngn_450(), "Adjustment".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation(_)));
        assert!(h.ledger.payouts().await.is_empty());
        assert_eq!(GatewayCalls::get(&h.gateway.calls.transfer), 0);
    }

    #[tokio::test]
    async fn test_accepted_payout_moves_to_processing() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        let card = h.seed_default_card(&provider).await;

        let payout = h
            .payout_service()
            .create_payout(provider.id, MoneyFixtures::ngn_450(), "Adjustment".to_string())
            .await
            .unwrap();

        assert_eq!(payout.status, PayoutStatus::Processing);
        assert_eq!(payout.payment_card_id, card.id);
        assert_eq!(payout.transfer_code.as_deref(), Some("TRF_0001"));
        assert_eq!(payout.reference, Some(payout.transfer_reference()));

        let transfers = h.gateway.transfers().await;
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount_minor, 45_000);
        assert_eq!(Some(&transfers[0].recipient_code), card.recipient_code.as_ref());

        let stored = &h.ledger.payouts().await[0];
        assert_eq!(stored.status, PayoutStatus::Processing);
        assert_event_count(&h.ledger.events().await, PaymentEventType::PayoutRequest, 1);
    }

    #[tokio::test]
    async fn test_rejected_payout_is_failed_with_reason() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        h.seed_default_card(&provider).await;
        h.gateway.reject_transfers("Insufficient balance").await;

        let err = h
            .payout_service()
            .create_payout(provider.id, MoneyFixtures::ngn_450(), "Adjustment".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Gateway(_)));
        let payouts = h.ledger.payouts().await;
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].status, PayoutStatus::Failed);
        assert!(payouts[0]
            .failure_reason
            .as_deref()
            .unwrap_or_default()
            .contains("Insufficient balance"));
        assert_event_count(&h.ledger.events().await, PaymentEventType::PayoutRequest, 0);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        h.seed_default_card(&provider).await;

        let err = h
            .payout_service()
            .create_payout(provider.id, MoneyFixtures::ngn_zero(), "Nothing".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation(_)));
        assert!(h.ledger.payouts().await.is_empty());
    }

    #[tokio::test]
    async fn test_sub_minor_amount_is_rejected_before_gateway() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        h.seed_default_card(&provider).await;

        let err = h
            .payout_service()
            .create_payout(provider.id, Money::new(dec!(0.004), Currency::NGN), "Dust".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation(_)));
        assert!(h.ledger.payouts().await.is_empty());
        assert_eq!(GatewayCalls::get(&h.gateway.calls.transfer), 0);
    }

    #[tokio::test]
    async fn test_payout_records_the_amount_transferred() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        h.seed_default_card(&provider).await;

        let payout = h
            .payout_service()
            .create_payout(provider.id, Money::new(dec!(100.016), Currency::NGN), "Adjustment".to_string())
            .await
            .unwrap();

        assert_eq!(payout.amount.amount(), dec!(100.02));
        let transfers = h.gateway.transfers().await;
        assert_eq!(transfers[0].amount_minor, 10_002);
        assert_eq!(h.ledger.payouts().await[0].amount.amount(), dec!(100.02));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_not_found() {
        let h = TestHarness::new();
        let err = h
            .payout_service()
            .create_payout(ProviderId::new(), MoneyFixtures::ngn_450(), "Adjustment".to_string())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_admin_payout_does_not_touch_earnings() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        h.seed_default_card(&provider).await;

        h.payout_service()
            .create_payout(provider.id, MoneyFixtures::ngn_450(), "Adjustment".to_string())
            .await
            .unwrap();

        let stored = h.marketplace.provider(provider.id).await.unwrap();
        assert!(stored.earnings.is_zero());
    }
}

// ============================================================================
// BOOKING COMPLETION
// ============================================================================

mod booking_completion {
    use super::*;

    #[tokio::test]
    async fn test_completion_pays_net_of_fee() {
        let h = TestHarness::new();
        let seeded = h.seed_booking(MoneyFixtures::ngn_500()).await;
        let payment = h.seed_paid_payment(&seeded.booking, Utc::now()).await;
        h.seed_default_card(&seeded.provider).await;

        let completed = h
            .payout_service()
            .complete_booking(seeded.booking.id)
            .await
            .unwrap();

        assert_eq!(completed.booking.status, BookingStatus::Completed);
        assert_eq!(completed.payout_error, None);
        let payout = completed.payout.unwrap();
        assert_eq!(payout.amount, MoneyFixtures::ngn_450());
        assert_eq!(payout.payment_ids, vec![payment.id]);
        assert_eq!(h.gateway.transfers().await[0].amount_minor, 45_000);

        let provider = h.marketplace.provider(seeded.provider.id).await.unwrap();
        assert_eq!(provider.earnings, MoneyFixtures::ngn_450());
        let booking = h.marketplace.booking(seeded.booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_completion_survives_payout_failure() {
        let h = TestHarness::new();
        let seeded = h.seed_booking(MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&seeded.booking, Utc::now()).await;

        let completed = h
            .payout_service()
            .complete_booking(seeded.booking.id)
            .await
            .unwrap();

        assert_eq!(completed.booking.status, BookingStatus::Completed);
        assert!(completed.payout.is_none());
        assert!(completed.payout_error.is_some());
        let provider = h.marketplace.provider(seeded.provider.id).await.unwrap();
        assert!(provider.earnings.is_zero());
    }

    #[tokio::test]
    async fn test_completion_without_payment_still_completes() {
        let h = TestHarness::new();
        let seeded = h.seed_booking(MoneyFixtures::ngn_500()).await;
        h.seed_default_card(&seeded.provider).await;

        let completed = h
            .payout_service()
            .complete_booking(seeded.booking.id)
            .await
            .unwrap();

        assert_eq!(completed.booking.status, BookingStatus::Completed);
        assert!(completed.payout.is_none());
        assert!(h.ledger.payouts().await.is_empty());
    }

    #[tokio::test]
    async fn test_pending_booking_cannot_be_completed() {
        let h = TestHarness::new();
        let customer = test_utils::test_customer();
        let booking = test_utils::TestBookingBuilder::new(customer.id).build();
        h.marketplace.insert_booking(booking.clone()).await;

        let err = h
            .payout_service()
            .complete_booking(booking.id)
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation(_)));
        let stored = h.marketplace.booking(booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let h = TestHarness::new();
        let err = h
            .payout_service()
            .complete_booking(BookingId::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_booking_payment_is_paid_out_once() {
        let h = TestHarness::new();
        let seeded = h.seed_booking(MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&seeded.booking, Utc::now()).await;
        h.seed_default_card(&seeded.provider).await;
        let service = h.payout_service();

        service.payout_for_completed_booking(seeded.booking.id).await.unwrap();
        let err = service
            .payout_for_completed_booking(seeded.booking.id)
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Conflict(_)));
        assert_eq!(h.gateway.transfers().await.len(), 1);
    }
}

// ============================================================================
// WEEKLY BATCH
// ============================================================================

mod weekly_batch {
    use super::*;

    #[tokio::test]
    async fn test_batch_isolates_failures_and_never_double_pays() {
        let h = TestHarness::new();
        let now = TemporalFixtures::batch_run();

        let paid = h.seed_provider().await;
        h.seed_default_card(&paid).await;
        for _ in 0..2 {
            let booking = h.seed_booking_for(&paid, MoneyFixtures::ngn_500()).await;
            h.seed_paid_payment(&booking, TemporalFixtures::within_batch_window()).await;
        }
        let old = h.seed_booking_for(&paid, MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&old, TemporalFixtures::before_batch_window()).await;

        let cardless = h.seed_provider().await;
        let booking = h.seed_booking_for(&cardless, MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&booking, TemporalFixtures::within_batch_window()).await;

        let rejected = h.seed_provider().await;
        h.card_service()
            .add_card(rejected.id, card_details(BankFixtures::second_account_number(), true))
            .await
            .unwrap();
        h.gateway
            .reject_transfers_to(&format!("RCP_{}", BankFixtures::second_account_number()))
            .await;
        let booking = h.seed_booking_for(&rejected, MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&booking, TemporalFixtures::within_batch_window()).await;

        let service = h.payout_service();
        let report = service.run_weekly_batch(now).await.unwrap();

        assert_eq!(report.providers_considered, 3);
        assert_eq!(report.payouts_created, 1);
        assert_eq!(report.failures, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.total_paid_out, dec!(1000.00));

        let transfers = h.gateway.transfers().await;
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount_minor, 100_000);
        let paid_provider = h.marketplace.provider(paid.id).await.unwrap();
        assert_eq!(paid_provider.earnings, Money::new(dec!(1000.00), Currency::NGN));
        let rejected_provider = h.marketplace.provider(rejected.id).await.unwrap();
        assert!(rejected_provider.earnings.is_zero());

        let second = service.run_weekly_batch(now).await.unwrap();
        assert_eq!(second.payouts_created, 0);
        assert_eq!(second.failures, 1);
        assert_eq!(h.gateway.transfers().await.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_skips_payments_already_paid_out() {
        let h = TestHarness::new();
        let seeded = h.seed_booking(MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&seeded.booking, TemporalFixtures::within_batch_window())
            .await;
        h.seed_default_card(&seeded.provider).await;
        h.payout_service()
            .payout_for_completed_booking(seeded.booking.id)
            .await
            .unwrap();

        let report = h
            .payout_service()
            .run_weekly_batch(TemporalFixtures::batch_run())
            .await
            .unwrap();

        assert_eq!(report.payouts_created, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(h.gateway.transfers().await.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_ignores_unapproved_providers() {
        let h = TestHarness::new();
        let suspended = TestProviderBuilder::new()
            .with_status(ProviderStatus::Suspended)
            .build();
        h.marketplace.insert_provider(suspended.clone()).await;
        let booking = h.seed_booking_for(&suspended, MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&booking, TemporalFixtures::within_batch_window()).await;

        let report = h
            .payout_service()
            .run_weekly_batch(TemporalFixtures::batch_run())
            .await
            .unwrap();

        assert_eq!(report.providers_considered, 0);
        assert_eq!(GatewayCalls::get(&h.gateway.calls.transfer), 0);
    }

    #[tokio::test]
    async fn test_batch_fee_is_configurable() {
        let h = TestHarness::new().with_payout_policy(PayoutPolicy {
            fee_on_weekly_batch: true,
            ..PayoutPolicy::default()
        });
        let provider = h.seed_provider().await;
        h.seed_default_card(&provider).await;
        let booking = h.seed_booking_for(&provider, MoneyFixtures::ngn_500()).await;
        h.seed_paid_payment(&booking, TemporalFixtures::within_batch_window()).await;

        let report = h
            .payout_service()
            .run_weekly_batch(TemporalFixtures::batch_run())
            .await
            .unwrap();

        assert_eq!(report.total_paid_out, dec!(450.00));
        assert_eq!(h.gateway.transfers().await[0].amount_minor, 45_000);
    }
}

// ============================================================================
// CARDS
// ============================================================================

mod cards {
    use super::*;

    #[tokio::test]
    async fn test_first_card_becomes_default() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;

        let card = h
            .card_service()
            .add_card(provider.id, card_details(BankFixtures::account_number(), false))
            .await
            .unwrap();

        assert!(card.is_default);
        assert!(card.is_verified);
        assert_eq!(
            card.recipient_code,
            Some(format!("RCP_{}", BankFixtures::account_number()))
        );
    }

    #[tokio::test]
    async fn test_set_default_leaves_exactly_one_default() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        let service = h.card_service();
        let first = service
            .add_card(provider.id, card_details(BankFixtures::account_number(), false))
            .await
            .unwrap();
        let second = service
            .add_card(provider.id, card_details(BankFixtures::second_account_number(), false))
            .await
            .unwrap();
        assert!(!second.is_default);

        let selected = service.set_default_card(provider.id, second.id).await.unwrap();
        assert!(selected.is_default);

        let cards = service.list_cards(provider.id).await.unwrap();
        let defaults: Vec<_> = cards.iter().filter(|c| c.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);
        assert!(cards.iter().any(|c| c.id == first.id && !c.is_default));
    }

    #[tokio::test]
    async fn test_make_default_moves_default() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;
        let service = h.card_service();
        service
            .add_card(provider.id, card_details(BankFixtures::account_number(), false))
            .await
            .unwrap();
        let second = service
            .add_card(provider.id, card_details(BankFixtures::second_account_number(), true))
            .await
            .unwrap();

        let cards = service.list_cards(provider.id).await.unwrap();
        assert_eq!(cards.iter().filter(|c| c.is_default).count(), 1);
        assert!(second.is_default);
    }

    #[tokio::test]
    async fn test_foreign_card_cannot_become_default() {
        let h = TestHarness::new();
        let owner = h.seed_provider().await;
        let other = h.seed_provider().await;
        let card = h.seed_default_card(&owner).await;

        let err = h
            .card_service()
            .set_default_card(other.id, card.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = h
            .card_service()
            .set_default_card(owner.id, PaymentCardId::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_account_number_is_rejected_before_gateway() {
        let h = TestHarness::new();
        let provider = h.seed_provider().await;

        let err = h
            .card_service()
            .add_card(provider.id, card_details("12345", true))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation(ref m) if m.starts_with("account_number")));
        assert_eq!(GatewayCalls::get(&h.gateway.calls.recipient), 0);
    }
}

// ============================================================================
// FEE PROPERTIES
// ============================================================================

mod fee_properties {
    use super::*;

    proptest! {
        #[test]
        fn prop_fee_and_net_sum_to_gross(gross in positive_money_strategy()) {
            let (fee, net) = PayoutPolicy::default().split(&gross).unwrap();
            prop_assert_eq!(fee.checked_add(&net).unwrap(), gross);
            prop_assert!(!fee.is_negative());
            prop_assert!(net.amount() <= gross.amount());
            prop_assert_eq!(fee.amount(), fee.amount().round_dp(2));
        }

        #[test]
        fn prop_fee_is_close_to_ten_percent(gross in positive_money_strategy()) {
            let (fee, _) = PayoutPolicy::default().split(&gross).unwrap();
            let exact = gross.amount() * dec!(0.10);
            prop_assert!((fee.amount() - exact).abs() <= dec!(0.005));
        }

        #[test]
        fn prop_booking_net_stays_positive(gross in ngn_booking_total_strategy()) {
            let (fee, net) = PayoutPolicy::default().split(&gross).unwrap();
            assert_money_positive(&net);
            assert_decimal_approx_eq(net.amount(), gross.amount() * dec!(0.90), dec!(0.005));
            assert_money_eq(&fee.checked_add(&net).unwrap(), &gross);
        }
    }
}

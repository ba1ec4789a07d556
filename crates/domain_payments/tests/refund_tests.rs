//! Refund Orchestrator and Poller Tests
//!
//! # Test Organization
//!
//! - `initiate` - refund guards and idempotent re-entry
//! - `poller` - terminal statuses, rescheduling and the STUCK ceiling
//! - `properties` - backoff schedule and gateway status mapping

use chrono::{Duration, Utc};
use proptest::prelude::*;

use core_kernel::PaymentId;
use domain_marketplace::BookingPaymentStatus;
use domain_payments::notification::NotificationKind;
use domain_payments::{
    JobStatus, Payment, PaymentError, PaymentEventType, PaymentStatus, RefundQueue, RefundStatus,
    RetryPolicy,
};
use test_utils::{
    assert_event_count, count_events, gateway_refund_status_strategy, retry_policy_strategy,
    GatewayCalls, MoneyFixtures, TestHarness,
};

async fn paid_payment(h: &TestHarness) -> Payment {
    let seeded = h.seed_booking(MoneyFixtures::ngn_500()).await;
    h.seed_paid_payment(&seeded.booking, Utc::now()).await
}

/// A time after every job enqueued "now" is due
fn later() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::hours(2)
}

// ============================================================================
// INITIATE
// ============================================================================

mod initiate {
    use super::*;

    #[tokio::test]
    async fn test_refund_paid_payment() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;

        let refund = h.refund_service().initiate_refund(payment.id).await.unwrap();

        assert_eq!(refund.status, RefundStatus::Initiated);
        assert_eq!(refund.amount, payment.amount);
        assert_eq!(refund.gateway_ref, "RF_0001");

        let stored = h.payment_service().get_payment(payment.id).await.unwrap();
        assert_eq!(stored.refund_reference.as_deref(), Some("RF_0001"));
        assert_eq!(stored.status, PaymentStatus::Paid);

        let jobs = h.ledger.jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].refund_id, refund.id);
        assert_eq!(jobs[0].refund_reference, "RF_0001");
        assert_eq!(jobs[0].status, JobStatus::Pending);
        assert!(jobs[0].run_at > Utc::now());
        assert_event_count(&h.ledger.events().await, PaymentEventType::RefundRequest, 1);
    }

    #[tokio::test]
    async fn test_refund_twice_calls_gateway_once() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        let service = h.refund_service();

        let first = service.initiate_refund(payment.id).await.unwrap();
        let second = service.initiate_refund(payment.id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(h.ledger.refunds().await.len(), 1);
        assert_eq!(h.ledger.jobs().await.len(), 1);
        assert_eq!(GatewayCalls::get(&h.gateway.calls.refund), 1);
    }

    #[tokio::test]
    async fn test_refund_of_pending_payment_is_rejected() {
        let h = TestHarness::new();
        let seeded = h.seed_booking(MoneyFixtures::ngn_500()).await;
        let initiated = h
            .payment_service()
            .initiate_payment(seeded.booking.id)
            .await
            .unwrap();

        let err = h
            .refund_service()
            .initiate_refund(initiated.payment_id)
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation(ref m) if m.contains("PENDING")));
        assert!(h.ledger.refunds().await.is_empty());
        assert_eq!(GatewayCalls::get(&h.gateway.calls.refund), 0);
    }

    #[tokio::test]
    async fn test_refund_unknown_payment_is_not_found() {
        let h = TestHarness::new();
        let err = h
            .refund_service()
            .initiate_refund(PaymentId::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_gateway_rejection_leaves_no_refund() {
        let h = TestHarness::new();
        h.gateway.reject_refunds("Transaction already fully reversed").await;
        let payment = paid_payment(&h).await;

        let err = h.refund_service().initiate_refund(payment.id).await.unwrap_err();

        assert!(matches!(err, PaymentError::Gateway(_)));
        assert!(h.ledger.refunds().await.is_empty());
        assert!(h.ledger.jobs().await.is_empty());
        let stored = h.payment_service().get_payment(payment.id).await.unwrap();
        assert_eq!(stored.refund_reference, None);
    }

    #[tokio::test]
    async fn test_check_refund_status() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        let service = h.refund_service();

        let err = service.check_refund_status(payment.id).await.unwrap_err();
        assert!(err.is_not_found());

        let refund = service.initiate_refund(payment.id).await.unwrap();
        let status = service.check_refund_status(payment.id).await.unwrap();
        assert_eq!(status.id, refund.id);
        assert_eq!(status.status, RefundStatus::Initiated);
    }
}

// ============================================================================
// POLLER
// ============================================================================

mod poller {
    use super::*;

    #[tokio::test]
    async fn test_nothing_due_before_first_delay() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();

        let report = h.refund_poller().run_once(Utc::now(), 10).await.unwrap();

        assert_eq!(report.claimed, 0);
        assert_eq!(GatewayCalls::get(&h.gateway.calls.fetch_refund), 0);
    }

    #[tokio::test]
    async fn test_processed_refund_completes_payment_and_booking() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();
        h.gateway.push_refund_status("processed").await;

        let report = h.refund_poller().run_once(later(), 10).await.unwrap();

        assert_eq!(report.claimed, 1);
        assert_eq!(report.completed, 1);
        assert_eq!(h.ledger.refunds().await[0].status, RefundStatus::Completed);
        let stored = h.payment_service().get_payment(payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Refunded);
        let booking = h.marketplace.booking(payment.booking_id).await.unwrap();
        assert_eq!(booking.payment_status, BookingPaymentStatus::Refunded);
        assert_eq!(h.ledger.jobs().await[0].status, JobStatus::Done);

        let sent = h.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::RefundCompleted);
    }

    #[tokio::test]
    async fn test_pending_refund_is_rescheduled_unchanged() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();
        let now = later();

        let report = h.refund_poller().run_once(now, 10).await.unwrap();

        assert_eq!(report.rescheduled, 1);
        assert_eq!(h.ledger.refunds().await[0].status, RefundStatus::Initiated);
        let stored = h.payment_service().get_payment(payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);

        let job = &h.ledger.jobs().await[0];
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 1);
        assert_eq!(job.run_at, now + Duration::seconds(60));
        assert!(h.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_backoff_doubles_between_attempts() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();
        let poller = h.refund_poller();

        let first = later();
        poller.run_once(first, 10).await.unwrap();
        let second = first + Duration::seconds(60);
        poller.run_once(second, 10).await.unwrap();

        let job = &h.ledger.jobs().await[0];
        assert_eq!(job.attempts, 2);
        assert_eq!(job.run_at, second + Duration::seconds(120));
    }

    #[tokio::test]
    async fn test_gateway_error_counts_as_attempt() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();
        h.gateway.push_refund_error("connection reset").await;

        let report = h.refund_poller().run_once(later(), 10).await.unwrap();

        assert_eq!(report.rescheduled, 1);
        let job = &h.ledger.jobs().await[0];
        assert_eq!(job.attempts, 1);
        assert!(job.last_error.as_deref().unwrap_or_default().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_failed_refund_notifies_and_keeps_payment_paid() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();
        h.gateway.push_refund_status("failed").await;

        let report = h.refund_poller().run_once(later(), 10).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(h.ledger.refunds().await[0].status, RefundStatus::Failed);
        let stored = h.payment_service().get_payment(payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);
        assert_eq!(h.notifier.sent().await[0].kind, NotificationKind::RefundFailed);
    }

    #[tokio::test]
    async fn test_exhausted_job_becomes_stuck() {
        let h = TestHarness::new().with_retry(RetryPolicy {
            base_delay_secs: 1,
            max_delay_secs: 4,
            max_attempts: 3,
        });
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();
        let poller = h.refund_poller();

        let mut now = later();
        let mut stuck = 0;
        for _ in 0..3 {
            let report = poller.run_once(now, 10).await.unwrap();
            assert_eq!(report.claimed, 1);
            stuck += report.stuck;
            now += Duration::seconds(10);
        }

        assert_eq!(stuck, 1);
        let job = &h.ledger.jobs().await[0];
        assert_eq!(job.status, JobStatus::Stuck);
        assert_eq!(job.attempts, 3);
        assert!(job.last_error.is_some());

        let report = poller.run_once(now + Duration::hours(1), 10).await.unwrap();
        assert_eq!(report.claimed, 0);

        let listed = h.ledger.list_stuck(10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_refund_update_logged_once_per_status() {
        let h = TestHarness::new();
        let payment = paid_payment(&h).await;
        h.refund_service().initiate_refund(payment.id).await.unwrap();
        let poller = h.refund_poller();

        let first = later();
        poller.run_once(first, 10).await.unwrap();
        poller.run_once(first + Duration::seconds(60), 10).await.unwrap();
        h.gateway.push_refund_status("success").await;
        poller.run_once(first + Duration::seconds(180), 10).await.unwrap();

        assert_eq!(count_events(&h.ledger.events().await, PaymentEventType::RefundUpdate), 2);
    }

    #[tokio::test]
    async fn test_batch_size_limits_claims() {
        let h = TestHarness::new();
        for _ in 0..3 {
            let payment = paid_payment(&h).await;
            h.refund_service().initiate_refund(payment.id).await.unwrap();
        }
        h.gateway.set_default_refund_status("success").await;

        let report = h.refund_poller().run_once(later(), 2).await.unwrap();

        assert_eq!(report.claimed, 2);
        assert_eq!(report.completed, 2);
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod properties {
    use super::*;

    proptest! {
        #[test]
        fn prop_schedule_never_exceeds_cap(policy in retry_policy_strategy(), attempt in 1u32..200) {
            let now = Utc::now();
            let next = policy.next_run_at(now, attempt);
            prop_assert!(next > now);
            prop_assert!(next - now <= Duration::seconds(policy.max_delay_secs as i64));
        }

        #[test]
        fn prop_exhaustion_is_reached_exactly_at_max_attempts(policy in retry_policy_strategy()) {
            prop_assert!(!policy.is_exhausted(policy.max_attempts - 1));
            prop_assert!(policy.is_exhausted(policy.max_attempts));
        }

        #[test]
        fn prop_only_known_strings_are_terminal(status in gateway_refund_status_strategy()) {
            let mapped = RefundStatus::from_gateway(&status);
            let known_terminal = matches!(status.as_str(), "success" | "processed" | "failed" | "reversed");
            prop_assert_eq!(mapped.is_terminal(), known_terminal);
        }
    }
}

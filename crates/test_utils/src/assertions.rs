//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_payments::{PaymentEvent, PaymentEventType};
use rust_decimal::Decimal;

/// Asserts that a Money value has the given currency and amount
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts a decimal lies within a tolerance of the expected value
pub fn assert_decimal_approx_eq(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "Decimals differ by more than tolerance: actual={}, expected={}, diff={}",
        actual,
        expected,
        diff
    );
}

/// Counts events of one type
pub fn count_events(events: &[PaymentEvent], event_type: PaymentEventType) -> usize {
    events.iter().filter(|e| e.event_type == event_type).count()
}

/// Asserts exactly `expected` events of the given type were logged
pub fn assert_event_count(events: &[PaymentEvent], event_type: PaymentEventType, expected: usize) {
    let actual = count_events(events, event_type);
    assert_eq!(
        actual,
        expected,
        "Expected {} {} events, found {}",
        expected,
        event_type.as_str(),
        actual
    );
}

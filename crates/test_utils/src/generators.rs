//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use core_kernel::{Currency, Money};
use domain_payments::RetryPolicy;
use proptest::prelude::*;

/// Strategy for generating settlement currencies
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::NGN),
        Just(Currency::GHS),
        Just(Currency::KES),
        Just(Currency::ZAR),
        Just(Currency::USD),
    ]
}

/// Strategy for generating positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating positive NGN booking totals
pub fn ngn_booking_total_strategy() -> impl Strategy<Value = Money> {
    (100i64..100_000_000i64).prop_map(|minor| Money::from_minor(minor, Currency::NGN))
}

/// Strategy for generating retry policies with base <= cap
pub fn retry_policy_strategy() -> impl Strategy<Value = RetryPolicy> {
    (1u64..600, 1u32..50).prop_flat_map(|(base, max_attempts)| {
        (base..base * 100).prop_map(move |cap| RetryPolicy {
            base_delay_secs: base,
            max_delay_secs: cap,
            max_attempts,
        })
    })
}

/// Strategy for gateway refund status strings, known and unknown
pub fn gateway_refund_status_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("pending".to_string()),
        Just("processing".to_string()),
        Just("needs-attention".to_string()),
        Just("processed".to_string()),
        Just("success".to_string()),
        Just("failed".to_string()),
        Just("reversed".to_string()),
        "[a-z-]{1,16}",
    ]
}

//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities of the marketplace.
//! These fixtures are designed to be consistent and predictable for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{Currency, Money};
use rust_decimal_macros::dec;

/// Shared secret used to sign test webhooks
pub const WEBHOOK_SECRET: &str = "sk_test_9d3f2b7c1e5a4680";

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The canonical booking total used across payout tests
    pub fn ngn_500() -> Money {
        Money::new(dec!(500.00), Currency::NGN)
    }

    /// The 500.00 booking net of the 10% platform fee
    pub fn ngn_450() -> Money {
        Money::new(dec!(450.00), Currency::NGN)
    }

    pub fn ngn_zero() -> Money {
        Money::zero(Currency::NGN)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A Monday morning batch run (Jun 3, 2024 06:00 UTC)
    pub fn batch_run() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 6, 0, 0).unwrap()
    }

    /// Two days before the batch run, inside the window
    pub fn within_batch_window() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap()
    }

    /// Ten days before the batch run, outside the window
    pub fn before_batch_window() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 24, 9, 0, 0).unwrap()
    }
}

/// Fixture for bank details
pub struct BankFixtures;

impl BankFixtures {
    pub fn account_number() -> &'static str {
        "0123456789"
    }

    pub fn second_account_number() -> &'static str {
        "9876543210"
    }

    pub fn bank_code() -> &'static str {
        "058"
    }
}

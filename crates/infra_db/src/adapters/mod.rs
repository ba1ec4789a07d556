//! Domain Adapters
//!
//! PostgreSQL implementations of the payments and marketplace ports.
//!
//! Each adapter:
//! - Implements one or more port traits
//! - Translates between domain models and repository rows
//! - Maps `DatabaseError` onto `PortError`
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedger;
//! use domain_payments::PaymentLedger;
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(PostgresLedger::new(pool));
//! let payments: Arc<dyn PaymentLedger> = ledger.clone();
//! ```

pub mod ledger;
pub mod queue;
pub mod marketplace;

pub use ledger::PostgresLedger;
pub use queue::PostgresRefundQueue;
pub use marketplace::PostgresMarketplace;

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, Currency, HealthCheckResult, Money, PortError};

use crate::error::DatabaseError;

/// Runs `SELECT 1` and reports the latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        },
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}

/// Rebuilds a `Money` from a NUMERIC amount and a CHAR(3) currency column
pub(crate) fn money(amount: Decimal, currency: &str) -> Result<Money, PortError> {
    let currency = Currency::from_str(currency.trim())
        .map_err(|e| PortError::from(DatabaseError::decode("currency", e)))?;
    Ok(Money::new(amount, currency))
}

/// Parses a status column with the domain type's own parser
pub(crate) fn status<T>(
    column: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, PortError> {
    parse(value).ok_or_else(|| DatabaseError::decode(column, format!("unknown value '{value}'")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_payments::PaymentStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_trims_padded_currency() {
        let amount = money(dec!(500.0000), "NGN").unwrap();
        assert_eq!(amount.currency(), Currency::NGN);
        assert_eq!(amount.amount(), dec!(500));
    }

    #[test]
    fn test_unknown_currency_is_internal() {
        let err = money(dec!(1), "XXX").unwrap_err();
        assert!(matches!(err, PortError::Internal { .. }));
    }

    #[test]
    fn test_status_decode() {
        assert_eq!(status("status", "PAID", PaymentStatus::parse).unwrap(), PaymentStatus::Paid);
        let err = status("status", "LOST", PaymentStatus::parse).unwrap_err();
        assert!(err.to_string().contains("LOST"));
    }
}

//! Quote pricing
//!
//! A quote is a base fare plus linear charges for distance, helpers and
//! floors carried, rounded to the currency precision:
//!
//! ```text
//! total = base_fare + per_km * distance_km + per_helper * helpers + per_floor * floors
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money};
use crate::error::MarketplaceError;

/// Upper bound on helpers a single booking may request
pub const MAX_HELPERS: u32 = 10;

/// Upper bound on floors per booking
pub const MAX_FLOORS: u32 = 50;

/// Input for a quote estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub distance_km: Decimal,
    pub helpers: u32,
    pub floors: u32,
}

/// Itemised quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub base_fare: Money,
    pub distance_charge: Money,
    pub helpers_charge: Money,
    pub floors_charge: Money,
    pub total: Money,
}

/// Rates used to price a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTable {
    pub currency: Currency,
    pub base_fare: Decimal,
    pub per_km: Decimal,
    pub per_helper: Decimal,
    pub per_floor: Decimal,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            currency: Currency::NGN,
            base_fare: dec!(5000),
            per_km: dec!(250),
            per_helper: dec!(3000),
            per_floor: dec!(1500),
        }
    }
}

impl PricingTable {
    /// Prices a move
    ///
    /// Rejects negative distances and helper/floor counts above the caps.
    pub fn quote(&self, request: &QuoteRequest) -> Result<Quote, MarketplaceError> {
        if request.distance_km.is_sign_negative() && !request.distance_km.is_zero() {
            return Err(MarketplaceError::InvalidQuote(
                "distance_km must not be negative".to_string(),
            ));
        }
        if request.helpers > MAX_HELPERS {
            return Err(MarketplaceError::InvalidQuote(format!(
                "helpers must be at most {MAX_HELPERS}"
            )));
        }
        if request.floors > MAX_FLOORS {
            return Err(MarketplaceError::InvalidQuote(format!(
                "floors must be at most {MAX_FLOORS}"
            )));
        }

        let money = |amount: Decimal| Money::new(amount, self.currency).round_to_currency();

        let base_fare = money(self.base_fare);
        let distance_charge = money(self.per_km * request.distance_km);
        let helpers_charge = money(self.per_helper * Decimal::from(request.helpers));
        let floors_charge = money(self.per_floor * Decimal::from(request.floors));

        let total = Money::sum(
            self.currency,
            [base_fare, distance_charge, helpers_charge, floors_charge].iter(),
        )
        .map_err(|e| MarketplaceError::InvalidQuote(e.to_string()))?;

        Ok(Quote {
            base_fare,
            distance_charge,
            helpers_charge,
            floors_charge,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(distance_km: Decimal, helpers: u32, floors: u32) -> QuoteRequest {
        QuoteRequest { distance_km, helpers, floors }
    }

    #[test]
    fn test_quote_sums_components() {
        let table = PricingTable::default();
        let quote = table.quote(&request(dec!(10), 2, 3)).unwrap();

        assert_eq!(quote.base_fare.amount(), dec!(5000));
        assert_eq!(quote.distance_charge.amount(), dec!(2500));
        assert_eq!(quote.helpers_charge.amount(), dec!(6000));
        assert_eq!(quote.floors_charge.amount(), dec!(4500));
        assert_eq!(quote.total.amount(), dec!(18000));
    }

    #[test]
    fn test_quote_rounds_fractional_distance() {
        let table = PricingTable {
            per_km: dec!(333.333),
            ..PricingTable::default()
        };
        let quote = table.quote(&request(dec!(1), 0, 0)).unwrap();
        assert_eq!(quote.distance_charge.amount(), dec!(333.33));
    }

    #[test]
    fn test_zero_distance_is_base_fare() {
        let quote = PricingTable::default().quote(&request(dec!(0), 0, 0)).unwrap();
        assert_eq!(quote.total.amount(), dec!(5000));
    }

    #[test]
    fn test_rejects_negative_distance() {
        let result = PricingTable::default().quote(&request(dec!(-1), 0, 0));
        assert!(matches!(result, Err(MarketplaceError::InvalidQuote(_))));
    }

    #[test]
    fn test_rejects_too_many_helpers() {
        let result = PricingTable::default().quote(&request(dec!(5), MAX_HELPERS + 1, 0));
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn quote_is_monotonic_in_distance(
            a in 0u32..5_000u32,
            b in 0u32..5_000u32,
        ) {
            let table = PricingTable::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let q_lo = table.quote(&QuoteRequest { distance_km: Decimal::from(lo), helpers: 1, floors: 0 }).unwrap();
            let q_hi = table.quote(&QuoteRequest { distance_km: Decimal::from(hi), helpers: 1, floors: 0 }).unwrap();
            prop_assert!(q_lo.total.amount() <= q_hi.total.amount());
        }
    }
}

//! Request and response bodies
//!
//! Money leaves the API as an explicit `amount` plus `currency` pair.

pub mod payments;
pub mod payouts;
pub mod cards;
pub mod bookings;
pub mod quotes;
pub mod admin;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Minor-unit precision shared by every supported currency
const AMOUNT_DECIMAL_PLACES: u32 = 2;

pub(crate) fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if !amount.is_sign_positive() || amount.is_zero() {
        return Err(ValidationError::new("positive").with_message("must be greater than zero".into()));
    }
    if amount.normalize().scale() > AMOUNT_DECIMAL_PLACES {
        return Err(ValidationError::new("scale").with_message("must have at most 2 decimal places".into()));
    }
    Ok(())
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("non_negative").with_message("must not be negative".into()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_checks() {
        assert!(positive_amount(&dec!(0.01)).is_ok());
        assert!(positive_amount(&dec!(0)).is_err());
        assert!(positive_amount(&dec!(-5)).is_err());
        assert!(positive_amount(&dec!(0.004)).is_err());
        assert!(positive_amount(&dec!(100.005)).is_err());
        assert!(positive_amount(&dec!(100.50)).is_ok());
        assert!(positive_amount(&dec!(100.5000)).is_ok());
        assert!(non_negative(&dec!(0)).is_ok());
        assert!(non_negative(&dec!(-0.5)).is_err());
    }
}

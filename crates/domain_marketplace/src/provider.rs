//! Moving-service providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, MoneyError, ProviderId};

/// Onboarding status of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Pending => "PENDING",
            ProviderStatus::Approved => "APPROVED",
            ProviderStatus::Rejected => "REJECTED",
            ProviderStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ProviderStatus::Pending),
            "APPROVED" => Some(ProviderStatus::Approved),
            "REJECTED" => Some(ProviderStatus::Rejected),
            "SUSPENDED" => Some(ProviderStatus::Suspended),
            _ => None,
        }
    }
}

/// A moving company or independent mover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub business_name: String,
    pub email: String,
    pub status: ProviderStatus,
    /// Lifetime net amount paid out to this provider
    pub earnings: Money,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    /// Creates a provider awaiting approval
    pub fn new(business_name: impl Into<String>, email: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: ProviderId::new_v7(),
            business_name: business_name.into(),
            email: email.into(),
            status: ProviderStatus::Pending,
            earnings: Money::zero(currency),
            created_at: Utc::now(),
        }
    }

    /// Only approved providers receive payouts in the weekly batch
    pub fn is_approved(&self) -> bool {
        self.status == ProviderStatus::Approved
    }

    /// Adds a successfully paid-out amount to the earnings total
    pub fn credit_earnings(&mut self, amount: &Money) -> Result<(), MoneyError> {
        self.earnings = self.earnings.checked_add(amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_earnings() {
        let mut provider = Provider::new("Swift Movers Ltd", "ops@swiftmovers.ng", Currency::NGN);
        provider
            .credit_earnings(&Money::new(dec!(450.00), Currency::NGN))
            .unwrap();
        assert_eq!(provider.earnings.amount(), dec!(450.00));
    }

    #[test]
    fn test_credit_earnings_currency_mismatch() {
        let mut provider = Provider::new("Swift Movers Ltd", "ops@swiftmovers.ng", Currency::NGN);
        let result = provider.credit_earnings(&Money::new(dec!(10), Currency::USD));
        assert!(result.is_err());
        assert!(provider.earnings.is_zero());
    }
}

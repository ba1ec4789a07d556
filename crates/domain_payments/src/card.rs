//! Provider payment cards (bank payout destinations)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{PaymentCardId, ProviderId};

/// Bank account numbers are 10-digit NUBAN numbers
pub const ACCOUNT_NUMBER_LEN: usize = 10;

/// A provider's bank destination for payouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCard {
    pub id: PaymentCardId,
    pub provider_id: ProviderId,
    pub account_number: String,
    pub account_name: String,
    pub bank_code: String,
    /// Gateway transfer recipient; payouts need it
    pub recipient_code: Option<String>,
    pub is_default: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentCard {
    /// Creates a verified, non-default card from a registered recipient
    pub fn from_recipient(
        provider_id: ProviderId,
        details: &NewCard,
        recipient_code: impl Into<String>,
    ) -> Self {
        Self {
            id: PaymentCardId::new_v7(),
            provider_id,
            account_number: details.account_number.clone(),
            account_name: details.account_name.trim().to_string(),
            bank_code: details.bank_code.trim().to_string(),
            recipient_code: Some(recipient_code.into()),
            is_default: false,
            is_verified: true,
            created_at: Utc::now(),
        }
    }

    /// Account number with all but the last four digits hidden
    pub fn masked_account_number(&self) -> String {
        let visible = self.account_number.len().saturating_sub(4);
        format!("{}{}", "*".repeat(visible), &self.account_number[visible..])
    }
}

/// Details submitted when adding a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub account_number: String,
    pub account_name: String,
    pub bank_code: String,
    #[serde(default)]
    pub make_default: bool,
}

impl NewCard {
    /// Validates the submitted details, returning the first problem found
    pub fn validate(&self) -> Result<(), (&'static str, String)> {
        if self.account_number.len() != ACCOUNT_NUMBER_LEN
            || !self.account_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err((
                "account_number",
                format!("account number must be {ACCOUNT_NUMBER_LEN} digits"),
            ));
        }
        if self.account_name.trim().is_empty() {
            return Err(("account_name", "account name is required".to_string()));
        }
        if self.bank_code.trim().is_empty() {
            return Err(("bank_code", "bank code is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(account_number: &str) -> NewCard {
        NewCard {
            account_number: account_number.to_string(),
            account_name: "Swift Movers Ltd".to_string(),
            bank_code: "058".to_string(),
            make_default: false,
        }
    }

    #[test]
    fn test_valid_card_details() {
        assert!(details("0123456789").validate().is_ok());
    }

    #[test]
    fn test_rejects_short_account_number() {
        let (field, _) = details("12345").validate().unwrap_err();
        assert_eq!(field, "account_number");
    }

    #[test]
    fn test_rejects_non_digit_account_number() {
        assert!(details("01234abcde").validate().is_err());
    }

    #[test]
    fn test_rejects_blank_bank_code() {
        let mut d = details("0123456789");
        d.bank_code = "  ".to_string();
        assert_eq!(d.validate().unwrap_err().0, "bank_code");
    }

    #[test]
    fn test_masked_account_number() {
        let card = PaymentCard::from_recipient(ProviderId::new(), &details("0123456789"), "RCP_x");
        assert_eq!(card.masked_account_number(), "******6789");
        assert!(card.is_verified);
        assert!(!card.is_default);
    }
}

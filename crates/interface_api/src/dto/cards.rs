//! Payment card DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{PaymentCardId, ProviderId};
use domain_payments::{NewCard, PaymentCard};

#[derive(Debug, Deserialize, Validate)]
pub struct AddCardRequest {
    #[validate(length(equal = 10, message = "account number must be 10 digits"))]
    pub account_number: String,
    #[validate(length(min = 1, max = 100))]
    pub account_name: String,
    #[validate(length(min = 1, max = 10))]
    pub bank_code: String,
    #[serde(default)]
    pub make_default: bool,
}

impl From<AddCardRequest> for NewCard {
    fn from(r: AddCardRequest) -> Self {
        NewCard {
            account_number: r.account_number,
            account_name: r.account_name,
            bank_code: r.bank_code,
            make_default: r.make_default,
        }
    }
}

/// Card as shown to callers; the account number is masked
#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub id: PaymentCardId,
    pub provider_id: ProviderId,
    pub account_number: String,
    pub account_name: String,
    pub bank_code: String,
    pub is_default: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentCard> for CardResponse {
    fn from(card: PaymentCard) -> Self {
        Self {
            account_number: card.masked_account_number(),
            id: card.id,
            provider_id: card.provider_id,
            account_name: card.account_name,
            bank_code: card.bank_code,
            is_default: card.is_default,
            is_verified: card.is_verified,
            created_at: card.created_at,
        }
    }
}

//! Provider payment cards

use std::sync::Arc;

use tracing::{info, instrument};

use core_kernel::{PaymentCardId, ProviderId};

use crate::card::{NewCard, PaymentCard};
use crate::error::PaymentError;
use crate::gateway::{PaymentGateway, TransferRecipientRequest};
use crate::services::{LedgerPorts, MarketplacePorts};

/// Registers bank destinations and manages the default card
pub struct CardService {
    ledger: LedgerPorts,
    marketplace: MarketplacePorts,
    gateway: Arc<dyn PaymentGateway>,
}

impl CardService {
    pub fn new(ledger: LedgerPorts, marketplace: MarketplacePorts, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            ledger,
            marketplace,
            gateway,
        }
    }

    /// Registers a bank account as a transfer recipient and stores the card
    ///
    /// The provider's first card becomes the default, as does any card added
    /// with `make_default`.
    #[instrument(skip(self, details), fields(provider_id = %provider_id))]
    pub async fn add_card(&self, provider_id: ProviderId, details: NewCard) -> Result<PaymentCard, PaymentError> {
        details
            .validate()
            .map_err(|(field, message)| PaymentError::validation(format!("{field}: {message}")))?;
        let provider = self.marketplace.providers.get_provider(provider_id).await?;

        let recipient_code = self
            .gateway
            .create_transfer_recipient(TransferRecipientRequest {
                account_name: details.account_name.trim().to_string(),
                account_number: details.account_number.clone(),
                bank_code: details.bank_code.trim().to_string(),
                currency: provider.earnings.currency(),
            })
            .await?;

        let existing = self.ledger.cards.list_cards(provider_id).await?;
        let make_default = details.make_default || existing.is_empty();

        let card = PaymentCard::from_recipient(provider_id, &details, recipient_code);
        self.ledger.cards.insert_card(&card).await?;

        info!(card_id = %card.id, make_default, "Payment card added");

        if make_default {
            return Ok(self.ledger.cards.set_default(provider_id, card.id).await?);
        }
        Ok(card)
    }

    /// Makes a card the provider's only default
    #[instrument(skip(self), fields(provider_id = %provider_id, card_id = %card_id))]
    pub async fn set_default_card(
        &self,
        provider_id: ProviderId,
        card_id: PaymentCardId,
    ) -> Result<PaymentCard, PaymentError> {
        Ok(self.ledger.cards.set_default(provider_id, card_id).await?)
    }

    pub async fn list_cards(&self, provider_id: ProviderId) -> Result<Vec<PaymentCard>, PaymentError> {
        Ok(self.ledger.cards.list_cards(provider_id).await?)
    }
}

//! Payout orchestration
//!
//! Three entry points create payouts:
//!
//! - `create_payout`: an admin-initiated transfer of an arbitrary amount
//! - `payout_for_completed_booking`: the booking's payment minus the platform fee
//! - `run_weekly_batch`: every approved provider's unsettled PAID payments
//!
//! The payout row is written PENDING before the gateway is called and is
//! never wrapped in a transaction with the gateway call. A crash between the
//! two leaves a PENDING payout for an operator to reconcile.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use core_kernel::{BookingId, Money, PaymentId, ProviderId, Rate};
use domain_marketplace::{Booking, BookingStatus, Provider};

use crate::error::PaymentError;
use crate::event::{PaymentEvent, PaymentEventType};
use crate::gateway::{PaymentGateway, TransferRequest};
use crate::payment::PaymentStatus;
use crate::payout::Payout;
use crate::services::{LedgerPorts, MarketplacePorts};

/// Fee and batching rules for payouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutPolicy {
    /// Deducted from the gross amount of a completed booking
    pub platform_fee: Rate,
    /// Whether the weekly batch deducts the platform fee too
    pub fee_on_weekly_batch: bool,
    /// How far back the weekly batch looks for PAID payments
    pub batch_window_days: i64,
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        Self {
            platform_fee: Rate::from_percentage(dec!(10)),
            fee_on_weekly_batch: false,
            batch_window_days: 7,
        }
    }
}

impl PayoutPolicy {
    /// Splits a gross amount into (fee, net)
    pub fn split(&self, gross: &Money) -> Result<(Money, Money), PaymentError> {
        let fee = self.platform_fee.apply(gross).round_to_currency();
        let net = gross.checked_sub(&fee)?;
        Ok((fee, net))
    }
}

/// Outcome of completing a booking
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedBooking {
    pub booking: Booking,
    pub payout: Option<Payout>,
    /// Why no payout was created, when it was attempted and failed
    pub payout_error: Option<String>,
}

/// Summary of one weekly batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub providers_considered: u32,
    pub payouts_created: u32,
    pub failures: u32,
    pub skipped: u32,
    /// Sum of net amounts accepted by the gateway
    pub total_paid_out: Decimal,
}

/// Orchestrates provider payouts
pub struct PayoutService {
    ledger: LedgerPorts,
    marketplace: MarketplacePorts,
    gateway: Arc<dyn PaymentGateway>,
    policy: PayoutPolicy,
}

impl PayoutService {
    pub fn new(
        ledger: LedgerPorts,
        marketplace: MarketplacePorts,
        gateway: Arc<dyn PaymentGateway>,
        policy: PayoutPolicy,
    ) -> Self {
        Self {
            ledger,
            marketplace,
            gateway,
            policy,
        }
    }

    pub fn policy(&self) -> &PayoutPolicy {
        &self.policy
    }

    /// Transfers `amount` to the provider's default card
    ///
    /// The amount is rounded to the currency's minor unit first, so the
    /// payout row records exactly what is transferred.
    ///
    /// # Errors
    ///
    /// - `PaymentError::Validation` for an amount that rounds to zero or less,
    ///   or a missing default card / recipient code
    /// - `PortError::NotFound` if the provider does not exist
    /// - `PaymentError::Gateway` when the transfer is refused; the payout is
    ///   left FAILED with the reason recorded
    #[instrument(skip(self, reason), fields(provider_id = %provider_id, amount = %amount))]
    pub async fn create_payout(
        &self,
        provider_id: ProviderId,
        amount: Money,
        reason: String,
    ) -> Result<Payout, PaymentError> {
        self.transfer(provider_id, amount, reason, Vec::new()).await
    }

    async fn transfer(
        &self,
        provider_id: ProviderId,
        amount: Money,
        reason: String,
        payment_ids: Vec<PaymentId>,
    ) -> Result<Payout, PaymentError> {
        let amount = amount.round_to_currency();
        if !amount.is_positive() {
            return Err(PaymentError::validation("payout amount must be positive"));
        }
        let amount_minor = amount.to_minor()?;
        self.marketplace.providers.get_provider(provider_id).await?;

        let card = self
            .ledger
            .cards
            .get_default(provider_id)
            .await?
            .ok_or_else(|| PaymentError::validation("provider has no default payment card"))?;
        let recipient_code = card
            .recipient_code
            .clone()
            .ok_or_else(|| PaymentError::validation("default payment card has no transfer recipient"))?;

        let mut payout = Payout::new(provider_id, card.id, amount, reason, payment_ids);
        self.ledger.payouts.insert_payout(&payout).await?;

        let request = TransferRequest {
            amount_minor,
            currency: amount.currency(),
            recipient_code,
            reference: payout.transfer_reference(),
            reason: payout.reason.clone(),
        };

        match self.gateway.create_transfer(request).await {
            Ok(receipt) => {
                payout.mark_processing(receipt.transfer_code.clone(), receipt.reference.clone());
                self.ledger.payouts.update_payout(&payout).await?;
                self.ledger
                    .events
                    .append(&PaymentEvent::new(
                        payout.payment_ids.first().copied(),
                        PaymentEventType::PayoutRequest,
                        self.gateway.name(),
                        receipt.reference,
                        json!({
                            "payoutId": payout.id.as_uuid().to_string(),
                            "transferCode": receipt.transfer_code,
                            "status": receipt.status,
                            "amount": amount_minor,
                        }),
                    ))
                    .await?;
                info!(payout_id = %payout.id, "Payout accepted by gateway");
                Ok(payout)
            }
            Err(gateway_error) => {
                payout.mark_failed(gateway_error.to_string());
                if let Err(store_error) = self.ledger.payouts.update_payout(&payout).await {
                    error!(payout_id = %payout.id, error = %store_error, "Failed to record payout failure");
                }
                warn!(payout_id = %payout.id, error = %gateway_error, "Payout rejected");
                Err(gateway_error.into())
            }
        }
    }

    /// Pays the provider for a completed booking, net of the platform fee
    ///
    /// Increments the provider's earnings by the net amount once the gateway
    /// accepts the transfer.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn payout_for_completed_booking(&self, booking_id: BookingId) -> Result<Payout, PaymentError> {
        let booking = self.marketplace.bookings.get_booking(booking_id).await?;
        let provider_id = booking.assigned_provider()?;

        let payment = self
            .ledger
            .payments
            .find_by_booking(booking_id)
            .await?
            .filter(|p| p.status == PaymentStatus::Paid)
            .ok_or_else(|| PaymentError::validation("booking has no PAID payment"))?;
        if self.ledger.payouts.is_payment_settled(payment.id).await? {
            return Err(PaymentError::conflict("booking payment already has a payout"));
        }

        let (fee, net) = self.policy.split(&payment.amount)?;
        info!(gross = %payment.amount, fee = %fee, net = %net, "Booking payout computed");

        let payout = self
            .transfer(
                provider_id,
                net,
                format!("Payout for booking {}", booking_id),
                vec![payment.id],
            )
            .await?;
        self.marketplace.providers.add_earnings(provider_id, net).await?;
        Ok(payout)
    }

    /// Marks a booking COMPLETED and attempts the completion payout
    ///
    /// Payout failures are logged and reported in the result; they never
    /// fail the completion itself.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn complete_booking(&self, booking_id: BookingId) -> Result<CompletedBooking, PaymentError> {
        let mut booking = self.marketplace.bookings.get_booking(booking_id).await?;
        if !matches!(booking.status, BookingStatus::Accepted | BookingStatus::InProgress) {
            return Err(PaymentError::validation(format!(
                "booking in status {} cannot be completed",
                booking.status.as_str()
            )));
        }
        booking.complete()?;
        self.marketplace
            .bookings
            .set_status(booking_id, BookingStatus::Completed)
            .await?;

        let (payout, payout_error) = match self.payout_for_completed_booking(booking_id).await {
            Ok(payout) => (Some(payout), None),
            Err(e) => {
                warn!(booking_id = %booking_id, error = %e, "Completion payout not created");
                (None, Some(e.to_string()))
            }
        };

        Ok(CompletedBooking {
            booking,
            payout,
            payout_error,
        })
    }

    /// Pays every approved provider for the week's unsettled PAID payments
    ///
    /// Per-provider failures are logged and counted; they never abort the
    /// batch. A payment linked to a live payout is never paid again.
    #[instrument(skip(self))]
    pub async fn run_weekly_batch(&self, now: DateTime<Utc>) -> Result<BatchReport, PaymentError> {
        let since = now - Duration::days(self.policy.batch_window_days);
        let providers = self.marketplace.providers.list_approved().await?;
        let mut report = BatchReport::default();

        for provider in providers {
            report.providers_considered += 1;
            match self.pay_provider(&provider, since).await {
                Ok(Some(net)) => {
                    report.payouts_created += 1;
                    report.total_paid_out += net.amount();
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    report.failures += 1;
                    warn!(provider_id = %provider.id, error = %e, "Weekly payout failed");
                }
            }
        }

        info!(
            providers = report.providers_considered,
            payouts = report.payouts_created,
            failures = report.failures,
            skipped = report.skipped,
            total = %report.total_paid_out,
            "Weekly payout batch finished"
        );
        Ok(report)
    }

    /// Returns the net amount paid, or None when there was nothing to pay
    async fn pay_provider(
        &self,
        provider: &Provider,
        since: DateTime<Utc>,
    ) -> Result<Option<Money>, PaymentError> {
        if self.ledger.cards.get_default(provider.id).await?.is_none() {
            info!(provider_id = %provider.id, "Skipping provider without default card");
            return Ok(None);
        }

        let payments = self.ledger.payments.list_unsettled_paid(provider.id, since).await?;
        let Some(first) = payments.first() else {
            return Ok(None);
        };
        let gross = Money::sum(first.amount.currency(), payments.iter().map(|p| &p.amount))?;
        if !gross.is_positive() {
            return Ok(None);
        }

        let net = if self.policy.fee_on_weekly_batch {
            self.policy.split(&gross)?.1
        } else {
            gross
        };

        let payment_ids = payments.iter().map(|p| p.id).collect();
        self.transfer(
            provider.id,
            net,
            format!("Weekly payout ({} bookings)", payments.len()),
            payment_ids,
        )
        .await?;
        self.marketplace.providers.add_earnings(provider.id, net).await?;
        Ok(Some(net))
    }

    /// Lists a provider's payouts
    pub async fn list_payouts(&self, provider_id: ProviderId) -> Result<Vec<Payout>, PaymentError> {
        self.marketplace.providers.get_provider(provider_id).await?;
        Ok(self.ledger.payouts.list_for_provider(provider_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;

    #[test]
    fn test_default_policy_splits_ten_percent() {
        let policy = PayoutPolicy::default();
        let (fee, net) = policy.split(&Money::new(dec!(500.00), Currency::NGN)).unwrap();
        assert_eq!(fee.amount(), dec!(50.00));
        assert_eq!(net.amount(), dec!(450.00));
        assert!(!policy.fee_on_weekly_batch);
    }

    #[test]
    fn test_split_rounds_fee_to_currency() {
        let policy = PayoutPolicy::default();
        let (fee, net) = policy.split(&Money::new(dec!(333.35), Currency::NGN)).unwrap();
        assert_eq!(fee.amount(), dec!(33.34));
        assert_eq!(net.amount(), dec!(300.01));
    }
}

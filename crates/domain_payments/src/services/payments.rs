//! Payment orchestration: checkout, webhooks and verification

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use core_kernel::{BookingId, Money, PaymentId, PortError};
use domain_marketplace::Booking;

use crate::error::PaymentError;
use crate::event::{PaymentEvent, PaymentEventType};
use crate::gateway::{InitializeTransaction, PaymentGateway};
use crate::notification::{NotificationKind, NotificationSink};
use crate::payment::{Payment, PaymentStatus};
use crate::payout::PayoutStatus;
use crate::services::{notify_customer, LedgerPorts, MarketplacePorts};
use crate::webhook::{WebhookData, WebhookEvent, WebhookVerifier};

/// Result of starting checkout
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedPayment {
    pub payment_id: PaymentId,
    pub authorization_url: String,
    /// Equals the payment id in display form
    pub reference: String,
}

/// Result of a verification call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayment {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub amount: Money,
    pub paid_at: Option<DateTime<Utc>>,
}

/// What a webhook delivery did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// State changed
    Applied,
    /// Already processed earlier
    Duplicate,
    /// Accepted without a state change
    Ignored,
}

/// Orchestrates booking payments
pub struct PaymentService {
    ledger: LedgerPorts,
    marketplace: MarketplacePorts,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
    verifier: WebhookVerifier,
    callback_url: Option<String>,
}

impl PaymentService {
    pub fn new(
        ledger: LedgerPorts,
        marketplace: MarketplacePorts,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            ledger,
            marketplace,
            gateway,
            notifier,
            verifier,
            callback_url: None,
        }
    }

    /// Sets the URL the gateway redirects the customer to after checkout
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Starts hosted checkout for a booking
    ///
    /// This method:
    /// 1. Loads the booking and checks it has a provider and a positive total
    /// 2. Reuses the booking's payment, or creates a PENDING one
    /// 3. Initializes the gateway transaction with reference = payment id
    /// 4. Stores the gateway reference and appends PAYMENT_INITIATED
    ///
    /// # Errors
    ///
    /// - `PortError::NotFound` if the booking does not exist
    /// - `PaymentError::Validation` if the booking is unassigned or has no total
    /// - `PaymentError::Conflict` if the booking is already paid or refunded
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn initiate_payment(&self, booking_id: BookingId) -> Result<InitiatedPayment, PaymentError> {
        let booking = self.marketplace.bookings.get_booking(booking_id).await?;
        let provider_id = booking
            .provider_id
            .ok_or_else(|| PaymentError::validation("booking has no assigned provider"))?;
        if !booking.quoted_total.is_positive() {
            return Err(PaymentError::validation("booking total must be positive"));
        }

        let mut payment = match self.ledger.payments.find_by_booking(booking_id).await? {
            Some(existing) if existing.is_settled() => {
                return Err(PaymentError::conflict(format!(
                    "payment for booking is already {}",
                    existing.status.as_str()
                )));
            }
            Some(existing) => existing,
            None => self.create_payment(&booking).await?,
        };
        payment.amount = booking.quoted_total;

        let customer = self.marketplace.customers.get_customer(booking.customer_id).await?;
        let reference = payment.checkout_reference();

        let session = self
            .gateway
            .initialize_transaction(InitializeTransaction {
                email: customer.email,
                amount_minor: payment.amount.to_minor()?,
                currency: payment.amount.currency(),
                reference: reference.clone(),
                callback_url: self.callback_url.clone(),
                metadata: json!({
                    "bookingId": booking_id.as_uuid().to_string(),
                    "paymentId": payment.id.as_uuid().to_string(),
                    "providerId": provider_id.as_uuid().to_string(),
                }),
            })
            .await?;

        payment.gateway_reference = Some(reference.clone());
        payment.updated_at = Utc::now();
        self.ledger.payments.update_payment(&payment).await?;

        self.ledger
            .events
            .append(&PaymentEvent::new(
                Some(payment.id),
                PaymentEventType::PaymentInitiated,
                self.gateway.name(),
                reference.clone(),
                json!({
                    "amount": payment.amount.to_minor()?,
                    "currency": payment.amount.currency(),
                    "accessCode": session.access_code,
                }),
            ))
            .await?;

        info!(payment_id = %payment.id, amount = %payment.amount, "Checkout initialized");

        Ok(InitiatedPayment {
            payment_id: payment.id,
            authorization_url: session.authorization_url,
            reference,
        })
    }

    /// Creates the booking's payment, tolerating a concurrent creator
    async fn create_payment(&self, booking: &Booking) -> Result<Payment, PaymentError> {
        let provider_id = booking.assigned_provider()?;
        let payment = Payment::new(booking.id, provider_id, booking.customer_id, booking.quoted_total);
        match self.ledger.payments.insert_payment(&payment).await {
            Ok(()) => Ok(payment),
            Err(e) if e.is_conflict() => self
                .ledger
                .payments
                .find_by_booking(booking.id)
                .await?
                .ok_or_else(|| PaymentError::from(PortError::not_found("Payment", booking.id))),
            Err(e) => Err(e.into()),
        }
    }

    /// Handles a signed gateway webhook
    ///
    /// The signature is checked over the raw body before anything is parsed.
    /// `charge.success` marks the payment PAID; transfer events finalize
    /// payouts; anything else is accepted with no state change.
    #[instrument(skip(self, raw_body, signature), fields(body_len = raw_body.len()))]
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentError> {
        self.verifier.verify(raw_body, signature)?;
        let event = WebhookEvent::parse(raw_body)?;

        match event.event.as_str() {
            "charge.success" => self.apply_charge_success(&event).await,
            "transfer.success" => self.apply_transfer_outcome(&event.data, PayoutStatus::Completed).await,
            "transfer.failed" | "transfer.reversed" => {
                self.apply_transfer_outcome(&event.data, PayoutStatus::Failed).await
            }
            other => {
                info!(event = other, "Webhook event ignored");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn apply_charge_success(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PaymentError> {
        let Some(mut payment) = self.resolve_charge_payment(&event.data).await? else {
            warn!(reference = ?event.data.reference, "charge.success for unknown payment");
            return Ok(WebhookOutcome::Ignored);
        };

        if payment.status == PaymentStatus::Refunded {
            warn!(payment_id = %payment.id, "charge.success after refund; status kept");
            return Ok(WebhookOutcome::Ignored);
        }

        // Written before the event so a redelivery repairs a partial failure
        if payment.status != PaymentStatus::Paid {
            payment.mark_paid(event.data.paid_at.unwrap_or_else(Utc::now));
            self.ledger.payments.update_payment(&payment).await?;
        }
        self.marketplace
            .bookings
            .set_payment_status(payment.booking_id, payment.status.booking_status())
            .await?;

        let event_ref = event
            .data
            .reference()
            .map(str::to_string)
            .unwrap_or_else(|| payment.checkout_reference());
        let recorded = self
            .ledger
            .events
            .append(&PaymentEvent::new(
                Some(payment.id),
                PaymentEventType::WebhookSuccess,
                self.gateway.name(),
                event_ref,
                event.raw.clone(),
            ))
            .await?;
        if !recorded {
            info!(payment_id = %payment.id, "Duplicate charge.success delivery");
            return Ok(WebhookOutcome::Duplicate);
        }

        info!(payment_id = %payment.id, booking_id = %payment.booking_id, "Payment confirmed by webhook");

        notify_customer(
            &self.marketplace,
            self.notifier.as_ref(),
            payment.booking_id,
            NotificationKind::PaymentConfirmed,
            payment.amount,
        )
        .await;

        Ok(WebhookOutcome::Applied)
    }

    /// Finds the payment by `data.reference`, then by `metadata.bookingId`
    async fn resolve_charge_payment(&self, data: &WebhookData) -> Result<Option<Payment>, PaymentError> {
        if let Some(reference) = data.reference() {
            if let Some(payment) = self.ledger.payments.find_by_gateway_reference(reference).await? {
                return Ok(Some(payment));
            }
        }
        match data.metadata_booking_id() {
            Some(booking_id) => Ok(self.ledger.payments.find_by_booking(booking_id).await?),
            None => Ok(None),
        }
    }

    async fn apply_transfer_outcome(
        &self,
        data: &WebhookData,
        outcome: PayoutStatus,
    ) -> Result<WebhookOutcome, PaymentError> {
        let mut payout = None;
        if let Some(reference) = data.reference() {
            payout = self.ledger.payouts.find_by_reference(reference).await?;
        }
        if payout.is_none() {
            if let Some(code) = data.transfer_code.as_deref() {
                payout = self.ledger.payouts.find_by_transfer_code(code).await?;
            }
        }
        let Some(mut payout) = payout else {
            warn!(reference = ?data.reference, transfer_code = ?data.transfer_code, "Transfer event for unknown payout");
            return Ok(WebhookOutcome::Ignored);
        };

        if payout.status.is_terminal() {
            return Ok(WebhookOutcome::Duplicate);
        }

        match outcome {
            PayoutStatus::Completed => payout.mark_completed(),
            _ => payout.mark_failed(
                data.gateway_response
                    .clone()
                    .or_else(|| data.status.clone())
                    .unwrap_or_else(|| "transfer failed".to_string()),
            ),
        }
        self.ledger.payouts.update_payout(&payout).await?;

        info!(payout_id = %payout.id, status = payout.status.as_str(), "Payout finalized by webhook");
        Ok(WebhookOutcome::Applied)
    }

    /// Verifies a payment with the gateway
    ///
    /// "success" marks the payment PAID, any other gateway status FAILED.
    /// A REFUNDED payment is returned unchanged without calling the gateway.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn verify_payment(&self, payment_id: PaymentId) -> Result<VerifiedPayment, PaymentError> {
        let mut payment = self.ledger.payments.get_payment(payment_id).await?;
        if payment.status == PaymentStatus::Refunded {
            return Ok(VerifiedPayment::from(&payment));
        }

        let reference = payment
            .gateway_reference
            .clone()
            .unwrap_or_else(|| payment.checkout_reference());
        let verification = self.gateway.verify_transaction(&reference).await?;

        if verification.is_success() {
            payment.mark_paid(verification.paid_at.or(payment.paid_at).unwrap_or_else(Utc::now));
        } else {
            payment.mark_failed();
        }
        self.ledger.payments.update_payment(&payment).await?;
        self.marketplace
            .bookings
            .set_payment_status(payment.booking_id, payment.status.booking_status())
            .await?;

        self.ledger
            .events
            .append(&PaymentEvent::new(
                Some(payment.id),
                PaymentEventType::Verification,
                self.gateway.name(),
                reference,
                verification.raw.clone(),
            ))
            .await?;

        info!(
            payment_id = %payment.id,
            gateway_status = %verification.status,
            status = payment.status.as_str(),
            "Payment verified"
        );

        Ok(VerifiedPayment::from(&payment))
    }

    /// Reads a payment
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        Ok(self.ledger.payments.get_payment(payment_id).await?)
    }
}

impl From<&Payment> for VerifiedPayment {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            status: payment.status,
            amount: payment.amount,
            paid_at: payment.paid_at,
        }
    }
}

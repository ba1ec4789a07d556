//! Refund orchestration

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use core_kernel::{PaymentId, PortError};

use crate::error::PaymentError;
use crate::event::{PaymentEvent, PaymentEventType};
use crate::gateway::PaymentGateway;
use crate::payment::PaymentStatus;
use crate::queue::{RefundPollJob, RetryPolicy};
use crate::refund::Refund;
use crate::services::LedgerPorts;

/// Requests refunds and queues their status polling
pub struct RefundService {
    ledger: LedgerPorts,
    gateway: Arc<dyn PaymentGateway>,
    retry: RetryPolicy,
}

impl RefundService {
    pub fn new(ledger: LedgerPorts, gateway: Arc<dyn PaymentGateway>, retry: RetryPolicy) -> Self {
        Self { ledger, gateway, retry }
    }

    /// Requests a full refund of a PAID payment
    ///
    /// This method:
    /// 1. Returns the latest refund without calling the gateway if one was
    ///    already requested for the payment
    /// 2. Requires a PAID payment with a gateway reference
    /// 3. Calls the gateway, records an INITIATED refund and the refund reference
    /// 4. Queues a poll job to run after the base delay
    ///
    /// # Errors
    ///
    /// - `PortError::NotFound` if the payment does not exist
    /// - `PaymentError::Validation` if the payment is not PAID or was never
    ///   sent to the gateway
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn initiate_refund(&self, payment_id: PaymentId) -> Result<Refund, PaymentError> {
        let mut payment = self.ledger.payments.get_payment(payment_id).await?;

        if payment.refund_reference.is_some() {
            info!("Refund already requested; returning existing refund");
            return self
                .ledger
                .refunds
                .latest_for_payment(payment_id)
                .await?
                .ok_or_else(|| PaymentError::from(PortError::not_found("Refund", payment_id)));
        }

        if payment.status != PaymentStatus::Paid {
            return Err(PaymentError::validation(format!(
                "only PAID payments can be refunded (status is {})",
                payment.status.as_str()
            )));
        }
        let transaction_reference = payment
            .gateway_reference
            .clone()
            .ok_or_else(|| PaymentError::validation("payment has no gateway reference"))?;

        let receipt = self.gateway.create_refund(&transaction_reference).await?;

        let refund = Refund::new(payment.id, payment.amount, self.gateway.name(), receipt.reference.clone());
        self.ledger.refunds.insert_refund(&refund).await?;

        payment.record_refund_reference(receipt.reference.clone());
        self.ledger.payments.update_payment(&payment).await?;

        self.ledger
            .events
            .append(&PaymentEvent::new(
                Some(payment.id),
                PaymentEventType::RefundRequest,
                self.gateway.name(),
                receipt.reference.clone(),
                json!({
                    "transactionReference": transaction_reference,
                    "status": receipt.status,
                    "gateway": receipt.raw,
                }),
            ))
            .await?;

        let job = RefundPollJob::new(
            refund.id,
            payment.id,
            receipt.reference,
            self.retry.first_run_at(Utc::now()),
        );
        self.ledger.refund_queue.enqueue(&job).await?;

        info!(refund_id = %refund.id, job_id = %job.id, "Refund requested");
        Ok(refund)
    }

    /// Returns the most recent refund of a payment
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` if the payment has never been refunded
    pub async fn check_refund_status(&self, payment_id: PaymentId) -> Result<Refund, PaymentError> {
        self.ledger
            .refunds
            .latest_for_payment(payment_id)
            .await?
            .ok_or_else(|| PaymentError::from(PortError::not_found("Refund", payment_id)))
    }
}

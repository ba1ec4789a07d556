//! PostgreSQL Payment Ledger Adapter
//!
//! One adapter backs every ledger port of the payments domain: payments,
//! the event log, refunds, payouts and payment cards. Orchestrators hold it
//! behind separate `Arc<dyn Port>` handles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::{debug, instrument};

use core_kernel::{
    BookingId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, PaymentCardId,
    PaymentEventId, PaymentId, PayoutId, PortError, ProviderId, RefundId,
};
use domain_payments::{
    CardStore, EventLog, Payment, PaymentCard, PaymentEvent, PaymentEventType, PaymentLedger,
    PaymentStatus, Payout, PayoutLedger, PayoutStatus, Refund, RefundLedger, RefundStatus,
};

use crate::repositories::payments::{PaymentEventRow, PaymentRow};
use crate::repositories::payouts::{PaymentCardRow, PayoutRow};
use crate::repositories::refunds::RefundRow;
use crate::repositories::{PaymentRepository, PayoutRepository, RefundRepository};

use super::{money, ping, status};

/// PostgreSQL-backed implementation of the payment ledger ports
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    payments: PaymentRepository,
    refunds: RefundRepository,
    payouts: PayoutRepository,
    pool: PgPool,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            payments: PaymentRepository::new(pool.clone()),
            refunds: RefundRepository::new(pool.clone()),
            payouts: PayoutRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresLedger {}

#[async_trait]
impl HealthCheckable for PostgresLedger {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-ledger-adapter").await
    }
}

#[async_trait]
impl PaymentLedger for PostgresLedger {
    #[instrument(skip(self, payment), fields(payment_id = %payment.id, booking_id = %payment.booking_id))]
    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError> {
        self.payments
            .insert(&payment_to_row(payment))
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        let row = self.payments.get(*id.as_uuid()).await?;
        row_to_payment(row)
    }

    #[instrument(skip(self), fields(booking_id = %booking_id))]
    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, PortError> {
        self.payments
            .find_by_booking(*booking_id.as_uuid())
            .await?
            .map(row_to_payment)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>, PortError> {
        self.payments
            .find_by_gateway_reference(reference)
            .await?
            .map(row_to_payment)
            .transpose()
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id, status = payment.status.as_str()))]
    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        self.payments
            .update(&payment_to_row(payment))
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self), fields(provider_id = %provider_id))]
    async fn list_unsettled_paid(
        &self,
        provider_id: ProviderId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Payment>, PortError> {
        let rows = self
            .payments
            .list_unsettled_paid(*provider_id.as_uuid(), since)
            .await?;
        debug!(count = rows.len(), "Unsettled payments loaded");
        rows.into_iter().map(row_to_payment).collect()
    }
}

#[async_trait]
impl EventLog for PostgresLedger {
    #[instrument(skip(self, event), fields(event_type = event.event_type.as_str(), gateway_ref = %event.gateway_ref))]
    async fn append(&self, event: &PaymentEvent) -> Result<bool, PortError> {
        let row = PaymentEventRow {
            id: *event.id.as_uuid(),
            payment_id: event.payment_id.map(|id| *id.as_uuid()),
            event_type: event.event_type.as_str().to_string(),
            gateway: event.gateway.clone(),
            gateway_ref: event.gateway_ref.clone(),
            payload: event.payload.clone(),
            created_at: event.created_at,
        };
        self.payments.append_event(&row).await.map_err(PortError::from)
    }

    #[instrument(skip(self), fields(payment_id = %payment_id))]
    async fn list_for_payment(&self, payment_id: PaymentId) -> Result<Vec<PaymentEvent>, PortError> {
        self.payments
            .events_for_payment(*payment_id.as_uuid())
            .await?
            .into_iter()
            .map(|row| {
                Ok(PaymentEvent {
                    id: PaymentEventId::from_uuid(row.id),
                    payment_id: row.payment_id.map(PaymentId::from_uuid),
                    event_type: status("event_type", &row.event_type, PaymentEventType::parse)?,
                    gateway: row.gateway,
                    gateway_ref: row.gateway_ref,
                    payload: row.payload,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RefundLedger for PostgresLedger {
    #[instrument(skip(self, refund), fields(refund_id = %refund.id, payment_id = %refund.payment_id))]
    async fn insert_refund(&self, refund: &Refund) -> Result<(), PortError> {
        let row = RefundRow {
            id: *refund.id.as_uuid(),
            payment_id: *refund.payment_id.as_uuid(),
            amount: refund.amount.amount(),
            currency: refund.amount.currency().code().to_string(),
            gateway: refund.gateway.clone(),
            gateway_ref: refund.gateway_ref.clone(),
            status: refund.status.as_str().to_string(),
            created_at: refund.created_at,
            updated_at: refund.updated_at,
        };
        self.refunds.insert(&row).await.map_err(PortError::from)
    }

    #[instrument(skip(self), fields(refund_id = %id))]
    async fn get_refund(&self, id: RefundId) -> Result<Refund, PortError> {
        row_to_refund(self.refunds.get(*id.as_uuid()).await?)
    }

    #[instrument(skip(self), fields(payment_id = %payment_id))]
    async fn latest_for_payment(&self, payment_id: PaymentId) -> Result<Option<Refund>, PortError> {
        self.refunds
            .latest_for_payment(*payment_id.as_uuid())
            .await?
            .map(row_to_refund)
            .transpose()
    }

    #[instrument(skip(self), fields(refund_id = %id, status = status.as_str()))]
    async fn update_status(&self, id: RefundId, status: RefundStatus) -> Result<(), PortError> {
        self.refunds
            .update_status(*id.as_uuid(), status.as_str())
            .await
            .map_err(PortError::from)
    }
}

#[async_trait]
impl PayoutLedger for PostgresLedger {
    #[instrument(skip(self, payout), fields(payout_id = %payout.id, items = payout.payment_ids.len()))]
    async fn insert_payout(&self, payout: &Payout) -> Result<(), PortError> {
        self.payouts
            .insert(&payout_to_row(payout))
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self), fields(payout_id = %id))]
    async fn get_payout(&self, id: PayoutId) -> Result<Payout, PortError> {
        row_to_payout(self.payouts.get(*id.as_uuid()).await?)
    }

    #[instrument(skip(self, payout), fields(payout_id = %payout.id, status = payout.status.as_str()))]
    async fn update_payout(&self, payout: &Payout) -> Result<(), PortError> {
        self.payouts
            .update(&payout_to_row(payout))
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self))]
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payout>, PortError> {
        let id = PayoutId::from_str(reference).ok().map(|id| *id.as_uuid());
        self.payouts
            .find_by_reference(reference, id)
            .await?
            .map(row_to_payout)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_transfer_code(&self, transfer_code: &str) -> Result<Option<Payout>, PortError> {
        self.payouts
            .find_by_transfer_code(transfer_code)
            .await?
            .map(row_to_payout)
            .transpose()
    }

    #[instrument(skip(self), fields(payment_id = %payment_id))]
    async fn is_payment_settled(&self, payment_id: PaymentId) -> Result<bool, PortError> {
        self.payouts
            .is_payment_settled(*payment_id.as_uuid())
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self), fields(provider_id = %provider_id))]
    async fn list_for_provider(&self, provider_id: ProviderId) -> Result<Vec<Payout>, PortError> {
        self.payouts
            .list_for_provider(*provider_id.as_uuid())
            .await?
            .into_iter()
            .map(row_to_payout)
            .collect()
    }
}

#[async_trait]
impl CardStore for PostgresLedger {
    #[instrument(skip(self, card), fields(card_id = %card.id, provider_id = %card.provider_id))]
    async fn insert_card(&self, card: &PaymentCard) -> Result<(), PortError> {
        let row = PaymentCardRow {
            id: *card.id.as_uuid(),
            provider_id: *card.provider_id.as_uuid(),
            account_number: card.account_number.clone(),
            account_name: card.account_name.clone(),
            bank_code: card.bank_code.clone(),
            recipient_code: card.recipient_code.clone(),
            is_default: card.is_default,
            is_verified: card.is_verified,
            created_at: card.created_at,
        };
        self.payouts.insert_card(&row).await.map_err(PortError::from)
    }

    #[instrument(skip(self), fields(provider_id = %provider_id))]
    async fn list_cards(&self, provider_id: ProviderId) -> Result<Vec<PaymentCard>, PortError> {
        Ok(self
            .payouts
            .list_cards(*provider_id.as_uuid())
            .await?
            .into_iter()
            .map(row_to_card)
            .collect())
    }

    #[instrument(skip(self), fields(provider_id = %provider_id))]
    async fn get_default(&self, provider_id: ProviderId) -> Result<Option<PaymentCard>, PortError> {
        Ok(self
            .payouts
            .get_default(*provider_id.as_uuid())
            .await?
            .map(row_to_card))
    }

    #[instrument(skip(self), fields(provider_id = %provider_id, card_id = %card_id))]
    async fn set_default(
        &self,
        provider_id: ProviderId,
        card_id: PaymentCardId,
    ) -> Result<PaymentCard, PortError> {
        let row = self
            .payouts
            .set_default(*provider_id.as_uuid(), *card_id.as_uuid())
            .await?;
        Ok(row_to_card(row))
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: *payment.id.as_uuid(),
        booking_id: *payment.booking_id.as_uuid(),
        provider_id: *payment.provider_id.as_uuid(),
        customer_id: *payment.customer_id.as_uuid(),
        amount: payment.amount.amount(),
        currency: payment.amount.currency().code().to_string(),
        status: payment.status.as_str().to_string(),
        gateway_reference: payment.gateway_reference.clone(),
        refund_reference: payment.refund_reference.clone(),
        paid_at: payment.paid_at,
        created_at: payment.created_at,
        updated_at: payment.updated_at,
    }
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, PortError> {
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        booking_id: BookingId::from_uuid(row.booking_id),
        provider_id: ProviderId::from_uuid(row.provider_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        amount: money(row.amount, &row.currency)?,
        status: status("status", &row.status, PaymentStatus::parse)?,
        gateway_reference: row.gateway_reference,
        refund_reference: row.refund_reference,
        paid_at: row.paid_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_refund(row: RefundRow) -> Result<Refund, PortError> {
    Ok(Refund {
        id: RefundId::from_uuid(row.id),
        payment_id: PaymentId::from_uuid(row.payment_id),
        amount: money(row.amount, &row.currency)?,
        gateway: row.gateway,
        gateway_ref: row.gateway_ref,
        status: status("status", &row.status, RefundStatus::parse)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn payout_to_row(payout: &Payout) -> PayoutRow {
    PayoutRow {
        id: *payout.id.as_uuid(),
        provider_id: *payout.provider_id.as_uuid(),
        payment_card_id: *payout.payment_card_id.as_uuid(),
        amount: payout.amount.amount(),
        currency: payout.amount.currency().code().to_string(),
        reason: payout.reason.clone(),
        status: payout.status.as_str().to_string(),
        transfer_code: payout.transfer_code.clone(),
        reference: payout.reference.clone(),
        failure_reason: payout.failure_reason.clone(),
        created_at: payout.created_at,
        updated_at: payout.updated_at,
        payment_ids: payout.payment_ids.iter().map(|id| *id.as_uuid()).collect(),
    }
}

fn row_to_payout(row: PayoutRow) -> Result<Payout, PortError> {
    Ok(Payout {
        id: PayoutId::from_uuid(row.id),
        provider_id: ProviderId::from_uuid(row.provider_id),
        payment_card_id: PaymentCardId::from_uuid(row.payment_card_id),
        amount: money(row.amount, &row.currency)?,
        reason: row.reason,
        status: status("status", &row.status, PayoutStatus::parse)?,
        transfer_code: row.transfer_code,
        reference: row.reference,
        failure_reason: row.failure_reason,
        payment_ids: row.payment_ids.into_iter().map(PaymentId::from_uuid).collect(),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_card(row: PaymentCardRow) -> PaymentCard {
    PaymentCard {
        id: PaymentCardId::from_uuid(row.id),
        provider_id: ProviderId::from_uuid(row.provider_id),
        account_number: row.account_number,
        account_name: row.account_name,
        bank_code: row.bank_code,
        recipient_code: row.recipient_code,
        is_default: row.is_default,
        is_verified: row.is_verified,
        created_at: row.created_at,
    }
}

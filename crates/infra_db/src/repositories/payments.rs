//! Payments and the payment event log

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

const PAYMENT_COLUMNS: &str = "id, booking_id, provider_id, customer_id, amount, currency, status, \
     gateway_reference, refund_reference, paid_at, created_at, updated_at";

/// A row of `payments`
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub gateway_reference: Option<String>,
    pub refund_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `payment_events`
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEventRow {
    pub id: Uuid,
    pub payment_id: Option<Uuid>,
    pub event_type: String,
    pub gateway: String,
    pub gateway_ref: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Repository for payments and their event log
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a payment; a second payment for the same booking violates
    /// the unique index on `booking_id`
    pub async fn insert(&self, row: &PaymentRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, provider_id, customer_id, amount, currency, status,
                                  gateway_reference, refund_reference, paid_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(row.id)
        .bind(row.booking_id)
        .bind(row.provider_id)
        .bind(row.customer_id)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.status)
        .bind(&row.gateway_reference)
        .bind(&row.refund_reference)
        .bind(row.paid_at)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<PaymentRow, DatabaseError> {
        sqlx::query_as::<_, PaymentRow>(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Payment", id))
    }

    pub async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<PaymentRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<PaymentRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway_reference = $1 LIMIT 1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Overwrites the mutable columns of a payment
    pub async fn update(&self, row: &PaymentRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET amount = $2, currency = $3, status = $4, gateway_reference = $5,
                refund_reference = $6, paid_at = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.status)
        .bind(&row.gateway_reference)
        .bind(&row.refund_reference)
        .bind(row.paid_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Payment", row.id));
        }
        Ok(())
    }

    /// PAID payments since `since` not linked to a PENDING, PROCESSING or
    /// COMPLETED payout
    pub async fn list_unsettled_paid(
        &self,
        provider_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments p
            WHERE p.provider_id = $1
              AND p.status = 'PAID'
              AND p.paid_at >= $2
              AND NOT EXISTS (
                  SELECT 1
                  FROM payout_items pi
                  JOIN payouts po ON po.id = pi.payout_id
                  WHERE pi.payment_id = p.id AND po.status <> 'FAILED'
              )
            ORDER BY p.paid_at
            "#
        ))
        .bind(provider_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Appends an event, returning false when its dedupe key already exists
    pub async fn append_event(&self, row: &PaymentEventRow) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_events (id, payment_id, event_type, gateway, gateway_ref, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT uq_payment_events_dedupe DO NOTHING
            "#,
        )
        .bind(row.id)
        .bind(row.payment_id)
        .bind(&row.event_type)
        .bind(&row.gateway)
        .bind(&row.gateway_ref)
        .bind(&row.payload)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn events_for_payment(&self, payment_id: Uuid) -> Result<Vec<PaymentEventRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PaymentEventRow>(
            r#"
            SELECT id, payment_id, event_type, gateway, gateway_ref, payload, created_at
            FROM payment_events
            WHERE payment_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

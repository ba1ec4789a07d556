//! Payouts, payout items and provider payment cards

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Payout columns plus the settled payments folded into an array
const PAYOUT_SELECT: &str = r#"
    SELECT p.id, p.provider_id, p.payment_card_id, p.amount, p.currency, p.reason, p.status,
           p.transfer_code, p.reference, p.failure_reason, p.created_at, p.updated_at,
           ARRAY(SELECT i.payment_id FROM payout_items i WHERE i.payout_id = p.id) AS payment_ids
    FROM payouts p
"#;

const CARD_COLUMNS: &str = "id, provider_id, account_number, account_name, bank_code, \
     recipient_code, is_default, is_verified, created_at";

/// A row of `payouts` joined with its items
#[derive(Debug, Clone, FromRow)]
pub struct PayoutRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub payment_card_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
    pub status: String,
    pub transfer_code: Option<String>,
    pub reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment_ids: Vec<Uuid>,
}

/// A row of `payment_cards`
#[derive(Debug, Clone, FromRow)]
pub struct PaymentCardRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub account_number: String,
    pub account_name: String,
    pub bank_code: String,
    pub recipient_code: Option<String>,
    pub is_default: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Repository for payouts and payment cards
#[derive(Debug, Clone)]
pub struct PayoutRepository {
    pool: PgPool,
}

impl PayoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a payout and one `payout_items` row per settled payment
    pub async fn insert(&self, row: &PayoutRow) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payouts (id, provider_id, payment_card_id, amount, currency, reason, status,
                                 transfer_code, reference, failure_reason, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(row.id)
        .bind(row.provider_id)
        .bind(row.payment_card_id)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.reason)
        .bind(&row.status)
        .bind(&row.transfer_code)
        .bind(&row.reference)
        .bind(&row.failure_reason)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await?;

        if !row.payment_ids.is_empty() {
            sqlx::query(
                "INSERT INTO payout_items (payout_id, payment_id) SELECT $1, UNNEST($2::uuid[])",
            )
            .bind(row.id)
            .bind(&row.payment_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(payout_id = %row.id, items = row.payment_ids.len(), "Payout inserted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<PayoutRow, DatabaseError> {
        sqlx::query_as::<_, PayoutRow>(&format!("{PAYOUT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Payout", id))
    }

    pub async fn update(&self, row: &PayoutRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE payouts
            SET status = $2, transfer_code = $3, reference = $4, failure_reason = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(&row.status)
        .bind(&row.transfer_code)
        .bind(&row.reference)
        .bind(&row.failure_reason)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Payout", row.id));
        }
        Ok(())
    }

    /// Matches the gateway reference, or the payout id the transfer was sent with
    pub async fn find_by_reference(
        &self,
        reference: &str,
        id: Option<Uuid>,
    ) -> Result<Option<PayoutRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PayoutRow>(&format!(
            "{PAYOUT_SELECT} WHERE p.reference = $1 OR p.id = $2 ORDER BY p.created_at DESC LIMIT 1"
        ))
        .bind(reference)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn find_by_transfer_code(&self, transfer_code: &str) -> Result<Option<PayoutRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PayoutRow>(&format!(
            "{PAYOUT_SELECT} WHERE p.transfer_code = $1 ORDER BY p.created_at DESC LIMIT 1"
        ))
        .bind(transfer_code)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// True if a payout that has not FAILED already covers the payment
    pub async fn is_payment_settled(&self, payment_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM payout_items i
                JOIN payouts p ON p.id = i.payout_id
                WHERE i.payment_id = $1 AND p.status <> 'FAILED'
            )
            "#,
        )
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<PayoutRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PayoutRow>(&format!(
            "{PAYOUT_SELECT} WHERE p.provider_id = $1 ORDER BY p.created_at DESC"
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn insert_card(&self, row: &PaymentCardRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payment_cards (id, provider_id, account_number, account_name, bank_code,
                                       recipient_code, is_default, is_verified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.id)
        .bind(row.provider_id)
        .bind(&row.account_number)
        .bind(&row.account_name)
        .bind(&row.bank_code)
        .bind(&row.recipient_code)
        .bind(row.is_default)
        .bind(row.is_verified)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_cards(&self, provider_id: Uuid) -> Result<Vec<PaymentCardRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PaymentCardRow>(&format!(
            "SELECT {CARD_COLUMNS} FROM payment_cards WHERE provider_id = $1 ORDER BY created_at"
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_default(&self, provider_id: Uuid) -> Result<Option<PaymentCardRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PaymentCardRow>(&format!(
            "SELECT {CARD_COLUMNS} FROM payment_cards WHERE provider_id = $1 AND is_default"
        ))
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Moves the provider's default flag onto `card_id`
    ///
    /// The partial unique index on `(provider_id) WHERE is_default` is
    /// checked per row, so the old default is cleared before the new one is
    /// set. Both writes share a transaction that holds row locks on the
    /// provider's cards.
    pub async fn set_default(&self, provider_id: Uuid, card_id: Uuid) -> Result<PaymentCardRow, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<Uuid> = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM payment_cards
            WHERE provider_id = $1
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(provider_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .find(|id| *id == card_id);

        if owned.is_none() {
            return Err(DatabaseError::not_found("PaymentCard", card_id));
        }

        sqlx::query(
            "UPDATE payment_cards SET is_default = FALSE WHERE provider_id = $1 AND is_default AND id <> $2",
        )
        .bind(provider_id)
        .bind(card_id)
        .execute(&mut *tx)
        .await?;

        let card = sqlx::query_as::<_, PaymentCardRow>(&format!(
            "UPDATE payment_cards SET is_default = TRUE WHERE id = $2 AND provider_id = $1 RETURNING {CARD_COLUMNS}"
        ))
        .bind(provider_id)
        .bind(card_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(card)
    }
}

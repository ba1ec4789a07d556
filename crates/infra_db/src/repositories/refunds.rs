//! Refunds and the refund poll queue

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

const JOB_COLUMNS: &str =
    "id, refund_id, payment_id, refund_reference, attempts, run_at, status, last_error, created_at";

/// A row of `refunds`
#[derive(Debug, Clone, FromRow)]
pub struct RefundRow {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub gateway: String,
    pub gateway_ref: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `refund_poll_jobs`
#[derive(Debug, Clone, FromRow)]
pub struct RefundJobRow {
    pub id: Uuid,
    pub refund_id: Uuid,
    pub payment_id: Uuid,
    pub refund_reference: String,
    pub attempts: i32,
    pub run_at: DateTime<Utc>,
    pub status: String,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for refunds and their poll jobs
#[derive(Debug, Clone)]
pub struct RefundRepository {
    pool: PgPool,
}

impl RefundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, row: &RefundRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refunds (id, payment_id, amount, currency, gateway, gateway_ref, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.id)
        .bind(row.payment_id)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.gateway)
        .bind(&row.gateway_ref)
        .bind(&row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<RefundRow, DatabaseError> {
        sqlx::query_as::<_, RefundRow>(
            r#"
            SELECT id, payment_id, amount, currency, gateway, gateway_ref, status, created_at, updated_at
            FROM refunds
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Refund", id))
    }

    pub async fn latest_for_payment(&self, payment_id: Uuid) -> Result<Option<RefundRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, RefundRow>(
            r#"
            SELECT id, payment_id, amount, currency, gateway, gateway_ref, status, created_at, updated_at
            FROM refunds
            WHERE payment_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE refunds SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Refund", id));
        }
        Ok(())
    }

    pub async fn enqueue(&self, row: &RefundJobRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refund_poll_jobs (id, refund_id, payment_id, refund_reference, attempts, run_at,
                                          status, last_error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            "#,
        )
        .bind(row.id)
        .bind(row.refund_id)
        .bind(row.payment_id)
        .bind(&row.refund_reference)
        .bind(row.attempts)
        .bind(row.run_at)
        .bind(&row.status)
        .bind(&row.last_error)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Claims due PENDING jobs by pushing their `run_at` to `lease_until`
    ///
    /// `FOR UPDATE SKIP LOCKED` lets concurrent workers claim disjoint sets.
    /// A worker that dies mid-job leaves the row to be reclaimed once the
    /// lease passes.
    pub async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RefundJobRow>, DatabaseError> {
        let mut rows = sqlx::query_as::<_, RefundJobRow>(&format!(
            r#"
            UPDATE refund_poll_jobs
            SET run_at = $3, updated_at = NOW()
            WHERE id IN (
                SELECT id
                FROM refund_poll_jobs
                WHERE status = 'PENDING' AND run_at <= $1
                ORDER BY run_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(limit)
        .bind(lease_until)
        .fetch_all(&self.pool)
        .await?;
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    /// Sets status, attempts, run time and last error of a job
    pub async fn update_job(
        &self,
        id: Uuid,
        status: &str,
        attempts: i32,
        run_at: Option<DateTime<Utc>>,
        last_error: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE refund_poll_jobs
            SET status = $2, attempts = $3, run_at = COALESCE($4, run_at),
                last_error = COALESCE($5, last_error), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(attempts)
        .bind(run_at)
        .bind(last_error)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("RefundPollJob", id));
        }
        Ok(())
    }

    pub async fn list_stuck(&self, limit: i64) -> Result<Vec<RefundJobRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, RefundJobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM refund_poll_jobs WHERE status = 'STUCK' ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

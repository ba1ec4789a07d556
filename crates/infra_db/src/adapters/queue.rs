//! PostgreSQL Refund Poll Queue
//!
//! Jobs live in `refund_poll_jobs`. Claiming pushes `run_at` forward by a
//! lease so that several pollers can share the table.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, JobId, PaymentId, PortError, RefundId,
};
use domain_payments::{JobStatus, RefundPollJob, RefundQueue};

use crate::repositories::refunds::RefundJobRow;
use crate::repositories::RefundRepository;

use super::{ping, status};

/// How long a claimed job stays hidden from other pollers
pub const DEFAULT_CLAIM_LEASE_SECS: i64 = 300;

/// PostgreSQL-backed `RefundQueue`
#[derive(Debug, Clone)]
pub struct PostgresRefundQueue {
    repository: RefundRepository,
    lease: Duration,
}

impl PostgresRefundQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: RefundRepository::new(pool),
            lease: Duration::seconds(DEFAULT_CLAIM_LEASE_SECS),
        }
    }

    /// Overrides the claim lease
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }
}

impl DomainPort for PostgresRefundQueue {}

#[async_trait]
impl HealthCheckable for PostgresRefundQueue {
    async fn health_check(&self) -> HealthCheckResult {
        ping(self.repository.pool(), "postgres-refund-queue").await
    }
}

#[async_trait]
impl RefundQueue for PostgresRefundQueue {
    #[instrument(skip(self, job), fields(job_id = %job.id, refund_id = %job.refund_id))]
    async fn enqueue(&self, job: &RefundPollJob) -> Result<(), PortError> {
        let row = RefundJobRow {
            id: *job.id.as_uuid(),
            refund_id: *job.refund_id.as_uuid(),
            payment_id: *job.payment_id.as_uuid(),
            refund_reference: job.refund_reference.clone(),
            attempts: attempts_to_db(job.attempts),
            run_at: job.run_at,
            status: job.status.as_str().to_string(),
            last_error: job.last_error.clone(),
            created_at: job.created_at,
        };
        self.repository.enqueue(&row).await.map_err(PortError::from)
    }

    #[instrument(skip(self))]
    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<RefundPollJob>, PortError> {
        let rows = self
            .repository
            .claim_due(now, now + self.lease, i64::from(limit))
            .await?;
        debug!(claimed = rows.len(), "Refund poll jobs claimed");
        rows.into_iter().map(row_to_job).collect()
    }

    #[instrument(skip(self, last_error), fields(job_id = %id))]
    async fn reschedule(
        &self,
        id: JobId,
        attempts: u32,
        run_at: DateTime<Utc>,
        last_error: Option<String>,
    ) -> Result<(), PortError> {
        self.repository
            .update_job(
                *id.as_uuid(),
                JobStatus::Pending.as_str(),
                attempts_to_db(attempts),
                Some(run_at),
                last_error.as_deref(),
            )
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn mark_done(&self, id: JobId, attempts: u32) -> Result<(), PortError> {
        self.repository
            .update_job(*id.as_uuid(), JobStatus::Done.as_str(), attempts_to_db(attempts), None, None)
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self, last_error), fields(job_id = %id))]
    async fn mark_stuck(&self, id: JobId, attempts: u32, last_error: String) -> Result<(), PortError> {
        self.repository
            .update_job(
                *id.as_uuid(),
                JobStatus::Stuck.as_str(),
                attempts_to_db(attempts),
                None,
                Some(&last_error),
            )
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self))]
    async fn list_stuck(&self, limit: u32) -> Result<Vec<RefundPollJob>, PortError> {
        self.repository
            .list_stuck(i64::from(limit))
            .await?
            .into_iter()
            .map(row_to_job)
            .collect()
    }
}

fn attempts_to_db(attempts: u32) -> i32 {
    i32::try_from(attempts).unwrap_or(i32::MAX)
}

fn row_to_job(row: RefundJobRow) -> Result<RefundPollJob, PortError> {
    Ok(RefundPollJob {
        id: JobId::from_uuid(row.id),
        refund_id: RefundId::from_uuid(row.refund_id),
        payment_id: PaymentId::from_uuid(row.payment_id),
        refund_reference: row.refund_reference,
        attempts: u32::try_from(row.attempts).unwrap_or_default(),
        run_at: row.run_at,
        status: status("status", &row.status, JobStatus::parse)?,
        last_error: row.last_error,
        created_at: row.created_at,
    })
}

//! Operator DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{JobId, PaymentId, RefundId};
use domain_payments::RefundPollJob;

pub const DEFAULT_STUCK_LIMIT: u32 = 50;
pub const MAX_STUCK_LIMIT: u32 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct StuckJobsQuery {
    pub limit: Option<u32>,
}

impl StuckJobsQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_STUCK_LIMIT).clamp(1, MAX_STUCK_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct RefundJobResponse {
    pub id: JobId,
    pub refund_id: RefundId,
    pub payment_id: PaymentId,
    pub refund_reference: String,
    pub attempts: u32,
    pub status: &'static str,
    pub last_error: Option<String>,
    pub run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<RefundPollJob> for RefundJobResponse {
    fn from(job: RefundPollJob) -> Self {
        Self {
            id: job.id,
            refund_id: job.refund_id,
            payment_id: job.payment_id,
            refund_reference: job.refund_reference,
            attempts: job.attempts,
            status: job.status.as_str(),
            last_error: job.last_error,
            run_at: job.run_at,
            created_at: job.created_at,
        }
    }
}

//! Durable refund poll queue
//!
//! Each requested refund gets one job row. The worker claims due jobs, asks
//! the gateway for the refund status and either finishes the job or pushes
//! `run_at` forward with exponential backoff. A job that reaches the attempt
//! ceiling without a terminal gateway status becomes STUCK and waits for an
//! operator.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, JobId, PaymentId, PortError, RefundId};

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Done,
    Stuck,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Done => "DONE",
            JobStatus::Stuck => "STUCK",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "DONE" => Some(JobStatus::Done),
            "STUCK" => Some(JobStatus::Stuck),
            _ => None,
        }
    }
}

/// A queued refund status check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundPollJob {
    pub id: JobId,
    pub refund_id: RefundId,
    pub payment_id: PaymentId,
    pub refund_reference: String,
    /// Gateway polls already made
    pub attempts: u32,
    pub run_at: DateTime<Utc>,
    pub status: JobStatus,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RefundPollJob {
    pub fn new(
        refund_id: RefundId,
        payment_id: PaymentId,
        refund_reference: impl Into<String>,
        run_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JobId::new_v7(),
            refund_id,
            payment_id,
            refund_reference: refund_reference.into(),
            attempts: 0,
            run_at,
            status: JobStatus::Pending,
            last_error: None,
            created_at: Utc::now(),
        }
    }
}

/// Backoff and ceiling for refund polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_secs: 60,
            max_delay_secs: 3600,
            max_attempts: 20,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given 1-based attempt: `base * 2^(attempt-1)`, capped
    pub fn delay_secs(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(63);
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        self.base_delay_secs
            .saturating_mul(factor)
            .min(self.max_delay_secs)
    }

    /// When a job should next run after the given attempt
    pub fn next_run_at(&self, now: DateTime<Utc>, attempt: u32) -> DateTime<Utc> {
        let secs = self.delay_secs(attempt).min(u64::from(u32::MAX));
        now.checked_add_signed(Duration::seconds(secs as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// When a freshly enqueued job first runs
    pub fn first_run_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_run_at(now, 1)
    }

    /// True once `attempts` polls have been made and no more are allowed
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

/// Durable queue of refund poll jobs
#[async_trait]
pub trait RefundQueue: DomainPort {
    async fn enqueue(&self, job: &RefundPollJob) -> Result<(), PortError>;

    /// Claims up to `limit` PENDING jobs with `run_at <= now`
    ///
    /// Claimed jobs are hidden from other workers until rescheduled,
    /// finished, or their lease runs out.
    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<RefundPollJob>, PortError>;

    /// Records a non-terminal attempt and sets the next run time
    async fn reschedule(
        &self,
        id: JobId,
        attempts: u32,
        run_at: DateTime<Utc>,
        last_error: Option<String>,
    ) -> Result<(), PortError>;

    /// Marks a job DONE after a terminal refund status
    async fn mark_done(&self, id: JobId, attempts: u32) -> Result<(), PortError>;

    /// Marks a job STUCK once the attempt ceiling is reached
    async fn mark_stuck(&self, id: JobId, attempts: u32, last_error: String) -> Result<(), PortError>;

    /// Lists STUCK jobs, most recent first
    async fn list_stuck(&self, limit: u32) -> Result<Vec<RefundPollJob>, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_secs(1), 60);
        assert_eq!(policy.delay_secs(2), 120);
        assert_eq!(policy.delay_secs(3), 240);
        assert_eq!(policy.delay_secs(6), 1920);
        assert_eq!(policy.delay_secs(7), 3600);
        assert_eq!(policy.delay_secs(20), 3600);
    }

    #[test]
    fn test_backoff_never_overflows() {
        let policy = RetryPolicy {
            base_delay_secs: u64::MAX / 2,
            max_delay_secs: u64::MAX,
            max_attempts: 200,
        };
        assert_eq!(policy.delay_secs(100), u64::MAX);
    }

    #[test]
    fn test_exhaustion() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(19));
        assert!(policy.is_exhausted(20));
    }

    #[test]
    fn test_first_run_is_after_base_delay() {
        let policy = RetryPolicy::default();
        let now = Utc::now();
        assert_eq!(policy.first_run_at(now) - now, Duration::seconds(60));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn delay_is_monotonic_and_capped(
            base in 1u64..600,
            cap in 600u64..86_400,
            attempt in 1u32..64,
        ) {
            let policy = RetryPolicy { base_delay_secs: base, max_delay_secs: cap, max_attempts: 64 };
            let d = policy.delay_secs(attempt);
            let next = policy.delay_secs(attempt + 1);
            prop_assert!(d <= cap);
            prop_assert!(d <= next);
            prop_assert!(d >= base.min(cap));
        }
    }
}

//! Refund status polling worker
//!
//! ```text
//! claim due jobs ──> fetch refund ──> terminal? ──yes──> write ledger, notify, DONE
//!                         │               │
//!                       error             no
//!                         └───────┬───────┘
//!                                 ▼
//!                 attempts < max ? reschedule(backoff) : STUCK
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::error::PaymentError;
use crate::event::{PaymentEvent, PaymentEventType};
use crate::gateway::PaymentGateway;
use crate::notification::{NotificationKind, NotificationSink};
use crate::payment::PaymentStatus;
use crate::queue::{RefundPollJob, RetryPolicy};
use crate::refund::RefundStatus;
use crate::services::{notify_customer, LedgerPorts, MarketplacePorts};

/// Counts from one `run_once` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub claimed: u32,
    pub completed: u32,
    pub failed: u32,
    pub rescheduled: u32,
    pub stuck: u32,
}

enum JobOutcome {
    Terminal(RefundStatus),
    Pending(String),
}

/// Drives refund poll jobs to a terminal state
pub struct RefundPoller {
    ledger: LedgerPorts,
    marketplace: MarketplacePorts,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
    retry: RetryPolicy,
}

impl RefundPoller {
    pub fn new(
        ledger: LedgerPorts,
        marketplace: MarketplacePorts,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            ledger,
            marketplace,
            gateway,
            notifier,
            retry,
        }
    }

    /// Claims up to `batch_size` due jobs and processes them in order
    ///
    /// Errors while processing a single job count as a failed attempt for
    /// that job. Only queue errors abort the pass.
    #[instrument(skip(self))]
    pub async fn run_once(&self, now: DateTime<Utc>, batch_size: u32) -> Result<PollReport, PaymentError> {
        let jobs = self.ledger.refund_queue.claim_due(now, batch_size).await?;
        let mut report = PollReport {
            claimed: jobs.len() as u32,
            ..PollReport::default()
        };

        for job in jobs {
            let attempt = job.attempts + 1;
            let outcome = match self.poll(&job).await {
                Ok(outcome) => outcome,
                Err(e) => JobOutcome::Pending(e.to_string()),
            };

            match outcome {
                JobOutcome::Terminal(status) => {
                    self.ledger.refund_queue.mark_done(job.id, attempt).await?;
                    match status {
                        RefundStatus::Completed => report.completed += 1,
                        _ => report.failed += 1,
                    }
                }
                JobOutcome::Pending(reason) => {
                    if self.retry.is_exhausted(attempt) {
                        warn!(
                            job_id = %job.id,
                            refund_reference = %job.refund_reference,
                            attempts = attempt,
                            last_error = %reason,
                            "Refund poll job exhausted; marking STUCK"
                        );
                        self.ledger.refund_queue.mark_stuck(job.id, attempt, reason).await?;
                        report.stuck += 1;
                    } else {
                        let run_at = self.retry.next_run_at(now, attempt);
                        self.ledger
                            .refund_queue
                            .reschedule(job.id, attempt, run_at, Some(reason))
                            .await?;
                        report.rescheduled += 1;
                    }
                }
            }
        }

        if report.claimed > 0 {
            info!(
                claimed = report.claimed,
                completed = report.completed,
                failed = report.failed,
                rescheduled = report.rescheduled,
                stuck = report.stuck,
                "Refund poll pass finished"
            );
        }
        Ok(report)
    }

    /// Asks the gateway about one refund and applies a terminal answer
    #[instrument(skip(self, job), fields(job_id = %job.id, refund_reference = %job.refund_reference))]
    async fn poll(&self, job: &RefundPollJob) -> Result<JobOutcome, PaymentError> {
        let lookup = self.gateway.fetch_refund(&job.refund_reference).await?;
        let status = RefundStatus::from_gateway(&lookup.status);

        self.ledger.refunds.update_status(job.refund_id, status).await?;
        self.ledger
            .events
            .append(&PaymentEvent::new(
                Some(job.payment_id),
                PaymentEventType::RefundUpdate,
                self.gateway.name(),
                format!("{}:{}", job.refund_reference, status.as_str()),
                json!({ "gatewayStatus": lookup.status, "gateway": lookup.raw }),
            ))
            .await?;

        if !status.is_terminal() {
            return Ok(JobOutcome::Pending(format!("refund still {}", lookup.status)));
        }

        let mut payment = self.ledger.payments.get_payment(job.payment_id).await?;
        let kind = if status == RefundStatus::Completed {
            payment.mark_refunded();
            self.ledger.payments.update_payment(&payment).await?;
            self.marketplace
                .bookings
                .set_payment_status(payment.booking_id, PaymentStatus::Refunded.booking_status())
                .await?;
            NotificationKind::RefundCompleted
        } else {
            NotificationKind::RefundFailed
        };

        info!(payment_id = %payment.id, status = status.as_str(), "Refund reached terminal status");

        notify_customer(
            &self.marketplace,
            self.notifier.as_ref(),
            payment.booking_id,
            kind,
            payment.amount,
        )
        .await;

        Ok(JobOutcome::Terminal(status))
    }
}

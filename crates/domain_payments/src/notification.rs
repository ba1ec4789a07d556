//! Customer notifications
//!
//! Notifications are best-effort. A failed send is logged and never fails
//! the payment, refund or payout operation that triggered it.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use core_kernel::{BookingId, Money};

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PaymentConfirmed,
    RefundCompleted,
    RefundFailed,
}

/// A message for one customer
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient_email: String,
    pub recipient_name: String,
    pub booking_id: BookingId,
    pub amount: Money,
}

#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Delivery channel for customer notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Sends and logs any failure instead of returning it
pub async fn notify_best_effort(sink: &dyn NotificationSink, notification: Notification) {
    if let Err(e) = sink.send(&notification).await {
        warn!(
            kind = ?notification.kind,
            booking_id = %notification.booking_id,
            error = %e,
            "Notification not delivered"
        );
    }
}

/// Writes notifications to the log
///
/// Used where no mail or SMS provider is wired in.
#[derive(Debug, Default, Clone)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            kind = ?notification.kind,
            to = %notification.recipient_email,
            booking_id = %notification.booking_id,
            amount = %notification.amount,
            "Customer notification"
        );
        Ok(())
    }
}

//! Payments Domain
//!
//! Booking payments, provider payouts, refunds and the refund status poller.
//!
//! # Payment Lifecycle
//!
//! ```text
//! PENDING ──webhook/verify──> PAID ──refund poller──> REFUNDED
//!    │                         ▲
//!    └──verify (not success)──> FAILED
//! ```
//!
//! # Payout Lifecycle
//!
//! ```text
//! PENDING ──gateway accepts──> PROCESSING ──transfer.success──> COMPLETED
//!    │                              │
//!    └──gateway error──> FAILED <───┴──transfer.failed / transfer.reversed
//! ```
//!
//! Orchestrators live in [`services`]; every storage and gateway dependency
//! is an `Arc<dyn Port>` defined in [`ports`], [`gateway`] and [`queue`].

pub mod payment;
pub mod event;
pub mod refund;
pub mod payout;
pub mod card;
pub mod gateway;
pub mod ports;
pub mod queue;
pub mod webhook;
pub mod notification;
pub mod services;
pub mod error;

pub use payment::{Payment, PaymentStatus};
pub use event::{PaymentEvent, PaymentEventType};
pub use refund::{Refund, RefundStatus};
pub use payout::{Payout, PayoutStatus};
pub use card::{PaymentCard, NewCard};
pub use gateway::{PaymentGateway, GatewayError};
pub use ports::{PaymentLedger, EventLog, RefundLedger, PayoutLedger, CardStore};
pub use queue::{RefundPollJob, JobStatus, RefundQueue, RetryPolicy};
pub use webhook::{WebhookVerifier, WebhookEvent, WebhookData};
pub use notification::{Notification, NotificationKind, NotificationSink, TracingNotificationSink};
pub use error::PaymentError;

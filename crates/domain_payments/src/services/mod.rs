//! Orchestrators
//!
//! Each service validates domain state, calls the gateway and writes the
//! ledger. They share the port bundles below so wiring happens once at
//! process start.

pub mod payments;
pub mod payouts;
pub mod refunds;
pub mod refund_poller;
pub mod cards;

use std::sync::Arc;

use tracing::warn;

use core_kernel::{BookingId, Money};
use domain_marketplace::{BookingPort, CustomerPort, ProviderPort};

use crate::notification::{notify_best_effort, Notification, NotificationKind, NotificationSink};
use crate::ports::{CardStore, EventLog, PaymentLedger, PayoutLedger, RefundLedger};
use crate::queue::RefundQueue;

pub use payments::{PaymentService, InitiatedPayment, VerifiedPayment, WebhookOutcome};
pub use payouts::{PayoutService, PayoutPolicy, BatchReport, CompletedBooking};
pub use refunds::RefundService;
pub use refund_poller::{RefundPoller, PollReport};
pub use cards::CardService;

/// Ledger storage handles
#[derive(Clone)]
pub struct LedgerPorts {
    pub payments: Arc<dyn PaymentLedger>,
    pub events: Arc<dyn EventLog>,
    pub refunds: Arc<dyn RefundLedger>,
    pub payouts: Arc<dyn PayoutLedger>,
    pub cards: Arc<dyn CardStore>,
    pub refund_queue: Arc<dyn RefundQueue>,
}

/// Marketplace storage handles
#[derive(Clone)]
pub struct MarketplacePorts {
    pub bookings: Arc<dyn BookingPort>,
    pub providers: Arc<dyn ProviderPort>,
    pub customers: Arc<dyn CustomerPort>,
}

/// Resolves the booking's customer and sends a best-effort notification
///
/// Lookup failures are logged the same way delivery failures are.
pub(crate) async fn notify_customer(
    marketplace: &MarketplacePorts,
    sink: &dyn NotificationSink,
    booking_id: BookingId,
    kind: NotificationKind,
    amount: Money,
) {
    let booking = match marketplace.bookings.get_booking(booking_id).await {
        Ok(b) => b,
        Err(e) => {
            warn!(booking_id = %booking_id, error = %e, "Skipping notification: booking lookup failed");
            return;
        }
    };
    let customer = match marketplace.customers.get_customer(booking.customer_id).await {
        Ok(c) => c,
        Err(e) => {
            warn!(booking_id = %booking_id, error = %e, "Skipping notification: customer lookup failed");
            return;
        }
    };

    notify_best_effort(
        sink,
        Notification {
            kind,
            recipient_email: customer.email,
            recipient_name: customer.full_name,
            booking_id,
            amount,
        },
    )
    .await;
}

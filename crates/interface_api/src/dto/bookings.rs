//! Booking completion DTOs

use serde::Serialize;

use core_kernel::BookingId;
use domain_payments::services::CompletedBooking;

use super::payouts::PayoutResponse;

#[derive(Debug, Serialize)]
pub struct CompleteBookingResponse {
    pub booking_id: BookingId,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub payout: Option<PayoutResponse>,
    /// Present when the booking completed but its payout could not be made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_error: Option<String>,
}

impl From<CompletedBooking> for CompleteBookingResponse {
    fn from(c: CompletedBooking) -> Self {
        Self {
            booking_id: c.booking.id,
            status: c.booking.status.as_str(),
            payment_status: c.booking.payment_status.as_str(),
            payout: c.payout.map(PayoutResponse::from),
            payout_error: c.payout_error,
        }
    }
}

//! Booking handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::BookingId;

use crate::auth::{authorize, authorize_role, Operation, Owner, Principal};
use crate::dto::bookings::CompleteBookingResponse;
use crate::error::ApiError;
use crate::AppState;

/// Marks a booking completed and pays its provider
///
/// The booking is completed even when the payout fails; the failure is
/// reported in `payout_error`.
pub async fn complete_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CompleteBookingResponse>, ApiError> {
    authorize_role(&principal, Operation::CompleteBooking)?;
    let booking_id = BookingId::from_uuid(booking_id);
    let booking = state.marketplace.bookings.get_booking(booking_id).await?;
    let owner = booking
        .provider_id
        .map(|id| Owner::Provider(*id.as_uuid()))
        .unwrap_or(Owner::Nobody);
    authorize(&principal, Operation::CompleteBooking, owner)?;

    let completed = state.payouts.complete_booking(booking_id).await?;
    Ok(Json(completed.into()))
}

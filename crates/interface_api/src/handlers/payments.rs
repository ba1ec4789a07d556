//! Payment and refund handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{BookingId, PaymentId};

use crate::auth::{authorize, authorize_role, Operation, Owner, Principal};
use crate::dto::payments::*;
use crate::error::ApiError;
use crate::AppState;

/// Header carrying the hex HMAC-SHA512 of the raw webhook body
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Starts hosted checkout for a booking
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
) -> Result<(StatusCode, Json<InitiatePaymentResponse>), ApiError> {
    authorize_role(&principal, Operation::InitiatePayment)?;
    let booking_id = BookingId::from_uuid(booking_id);
    let booking = state.marketplace.bookings.get_booking(booking_id).await?;
    authorize(
        &principal,
        Operation::InitiatePayment,
        Owner::Customer(*booking.customer_id.as_uuid()),
    )?;

    let initiated = state.payments.initiate_payment(booking_id).await?;
    Ok((StatusCode::CREATED, Json(initiated.into())))
}

/// Gateway webhook
///
/// Public; the signature over the raw body is the only credential.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.payments.handle_webhook(&body, signature).await?;
    Ok(Json(outcome.into()))
}

/// Re-checks a payment with the gateway
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    authorize_role(&principal, Operation::VerifyPayment)?;
    let payment_id = PaymentId::from_uuid(payment_id);
    let payment = state.payments.get_payment(payment_id).await?;
    authorize(
        &principal,
        Operation::VerifyPayment,
        Owner::Customer(*payment.customer_id.as_uuid()),
    )?;

    let verified = state.payments.verify_payment(payment_id).await?;
    Ok(Json(verified.into()))
}

/// Requests a full refund of a paid payment
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<Uuid>,
) -> Result<(StatusCode, Json<RefundResponse>), ApiError> {
    authorize(&principal, Operation::RefundPayment, Owner::Nobody)?;

    let refund = state
        .refunds
        .initiate_refund(PaymentId::from_uuid(payment_id))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(refund.into())))
}

/// Latest refund recorded for a payment
pub async fn refund_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<RefundResponse>, ApiError> {
    authorize_role(&principal, Operation::ViewRefundStatus)?;
    let payment_id = PaymentId::from_uuid(payment_id);
    let payment = state.payments.get_payment(payment_id).await?;
    authorize(
        &principal,
        Operation::ViewRefundStatus,
        Owner::Customer(*payment.customer_id.as_uuid()),
    )?;

    let refund = state.refunds.check_refund_status(payment_id).await?;
    Ok(Json(refund.into()))
}

//! Payout handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{Currency, Money, ProviderId};

use crate::auth::{authorize, Operation, Owner, Principal};
use crate::dto::payouts::*;
use crate::error::ApiError;
use crate::middleware::ValidatedJson;
use crate::AppState;

/// Creates an ad-hoc payout to the provider's default card
pub async fn create_payout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreatePayoutRequest>,
) -> Result<(StatusCode, Json<PayoutResponse>), ApiError> {
    authorize(&principal, Operation::CreatePayout, Owner::Nobody)?;

    let currency = match &request.currency {
        Some(code) => Currency::from_str(code),
        None => Currency::from_str(&state.config.currency),
    }
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let payout = state
        .payouts
        .create_payout(
            ProviderId::from_uuid(provider_id),
            Money::new(request.amount, currency),
            request.reason,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(payout.into())))
}

/// Lists a provider's payouts, newest first
pub async fn list_payouts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<PayoutResponse>>, ApiError> {
    authorize(&principal, Operation::ViewPayouts, Owner::Provider(provider_id))?;

    let payouts = state
        .payouts
        .list_payouts(ProviderId::from_uuid(provider_id))
        .await?;
    Ok(Json(payouts.into_iter().map(PayoutResponse::from).collect()))
}

//! Payment card handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{PaymentCardId, ProviderId};

use crate::auth::{authorize, Operation, Owner, Principal};
use crate::dto::cards::*;
use crate::error::ApiError;
use crate::middleware::ValidatedJson;
use crate::AppState;

pub async fn list_cards(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<CardResponse>>, ApiError> {
    authorize(&principal, Operation::ManageCards, Owner::Provider(provider_id))?;

    let cards = state.cards.list_cards(ProviderId::from_uuid(provider_id)).await?;
    Ok(Json(cards.into_iter().map(CardResponse::from).collect()))
}

/// Registers a bank account as a transfer recipient
pub async fn add_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), ApiError> {
    authorize(&principal, Operation::ManageCards, Owner::Provider(provider_id))?;

    let card = state
        .cards
        .add_card(ProviderId::from_uuid(provider_id), request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(card.into())))
}

pub async fn set_default_card(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((provider_id, card_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CardResponse>, ApiError> {
    authorize(&principal, Operation::ManageCards, Owner::Provider(provider_id))?;

    let card = state
        .cards
        .set_default_card(ProviderId::from_uuid(provider_id), PaymentCardId::from_uuid(card_id))
        .await?;
    Ok(Json(card.into()))
}

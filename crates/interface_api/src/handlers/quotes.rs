//! Quote handlers

use axum::{extract::State, Extension, Json};

use domain_marketplace::pricing::QuoteRequest;

use crate::auth::{authorize, Operation, Owner, Principal};
use crate::dto::quotes::*;
use crate::error::ApiError;
use crate::middleware::ValidatedJson;
use crate::AppState;

/// Prices a move from distance, helpers and floors
pub async fn estimate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(request): ValidatedJson<QuoteEstimateRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    authorize(&principal, Operation::EstimateQuote, Owner::Nobody)?;

    let quote = state.pricing.quote(&QuoteRequest::from(&request))?;
    Ok(Json(quote.into()))
}

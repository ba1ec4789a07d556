//! Operator handlers

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::auth::{authorize, Operation, Owner, Principal};
use crate::dto::admin::*;
use crate::error::ApiError;
use crate::AppState;

/// Refund poll jobs that exhausted their retries
pub async fn list_stuck_refund_jobs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StuckJobsQuery>,
) -> Result<Json<Vec<RefundJobResponse>>, ApiError> {
    authorize(&principal, Operation::ListStuckRefundJobs, Owner::Nobody)?;

    let jobs = state.refund_queue.list_stuck(query.limit()).await?;
    Ok(Json(jobs.into_iter().map(RefundJobResponse::from).collect()))
}

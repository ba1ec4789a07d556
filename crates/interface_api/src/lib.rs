//! HTTP API Layer
//!
//! REST surface of the marketplace payments core, plus the process wiring
//! shared with the refund worker and payout batch binaries.
//!
//! # Architecture
//!
//! - **Handlers**: one module per resource, each authorizing its operation
//! - **Middleware**: JWT authentication, audit logging, validated JSON bodies
//! - **DTOs**: request/response bodies with explicit amount and currency
//! - **State**: orchestrators built once from a [`Backends`] bundle
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(config, &backends)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod telemetry;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod dto;
pub mod handlers;
pub mod state;
pub mod wiring;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, bookings, cards, health, payments, payouts, quotes};
use crate::middleware::{audit_middleware, auth_middleware};

pub use crate::config::ApiConfig;
pub use crate::error::ApiError;
pub use crate::state::{AppState, Backends};

/// Creates the main API router
///
/// Health checks and the gateway webhook are public; every other route
/// requires a bearer token.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let webhook_routes = Router::new().route("/payments/webhook", post(payments::webhook));

    let payment_routes = Router::new()
        .route("/:booking_id/initiate", post(payments::initiate_payment))
        .route("/:payment_id/verify", get(payments::verify_payment))
        .route("/:payment_id/refund", post(payments::refund_payment))
        .route("/:payment_id/refund-status", get(payments::refund_status));

    let provider_routes = Router::new()
        .route(
            "/:provider_id/payouts",
            post(payouts::create_payout).get(payouts::list_payouts),
        )
        .route(
            "/:provider_id/cards",
            get(cards::list_cards).post(cards::add_card),
        )
        .route("/:provider_id/cards/:card_id/default", put(cards::set_default_card));

    let protected_routes = Router::new()
        .nest("/payments", payment_routes)
        .nest("/providers", provider_routes)
        .route("/bookings/:booking_id/complete", post(bookings::complete_booking))
        .route("/quotes/estimate", post(quotes::estimate))
        .route("/admin/refund-jobs/stuck", get(admin::list_stuck_refund_jobs))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", webhook_routes.merge(protected_routes))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

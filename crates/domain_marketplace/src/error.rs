//! Marketplace domain errors

use thiserror::Error;

/// Errors that can occur in the marketplace domain
#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("Invalid booking status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Booking has no assigned provider")]
    NoAssignedProvider,

    #[error("Invalid quote input: {0}")]
    InvalidQuote(String),
}

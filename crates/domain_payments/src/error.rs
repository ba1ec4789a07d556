//! Payments domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use domain_marketplace::MarketplaceError;

use crate::gateway::GatewayError;

/// Errors returned by the payment, payout, refund and card orchestrators
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedWebhook(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),
}

impl PaymentError {
    pub fn validation(message: impl Into<String>) -> Self {
        PaymentError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PaymentError::Conflict(message.into())
    }

    /// Returns true if the underlying cause is a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, PaymentError::Port(e) if e.is_not_found())
    }
}

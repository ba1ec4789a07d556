//! Payment Gateway Port
//!
//! The outbound side of the payments core: hosted checkout, transaction
//! verification, transfer recipients, transfers and refunds. Amounts cross
//! this boundary in minor units.
//!
//! - **REST Adapter**: Paystack-style HTTP client (infra_gateway)
//! - **Fake Adapter**: Scripted responses and call counters (test_utils)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{Currency, DomainPort};

/// Errors raised by a gateway adapter
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway answered and refused the request
    #[error("Gateway rejected request: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// The request never got an answer
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The answer could not be understood
    #[error("Gateway response could not be decoded: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Hosted checkout request
#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub reference: String,
    pub callback_url: Option<String>,
    pub metadata: serde_json::Value,
}

/// Hosted checkout session returned by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

/// Result of verifying a transaction by reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionVerification {
    /// Gateway transaction status, "success" when paid
    pub status: String,
    pub reference: String,
    pub amount_minor: i64,
    pub paid_at: Option<DateTime<Utc>>,
    pub raw: serde_json::Value,
}

impl TransactionVerification {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// Bank details registered as a transfer recipient
#[derive(Debug, Clone, Serialize)]
pub struct TransferRecipientRequest {
    pub account_name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: Currency,
}

/// Transfer request to a registered recipient
#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    pub amount_minor: i64,
    pub currency: Currency,
    pub recipient_code: String,
    pub reference: String,
    pub reason: String,
}

/// Gateway acknowledgement of a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_code: String,
    pub reference: String,
    pub status: String,
}

/// Gateway acknowledgement or lookup of a refund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// The gateway's refund reference
    pub reference: String,
    pub status: String,
    pub raw: serde_json::Value,
}

/// Port for the third-party payment gateway
#[async_trait]
pub trait PaymentGateway: DomainPort {
    /// Gateway name recorded on events and refunds
    fn name(&self) -> &'static str;

    /// Starts a hosted checkout
    ///
    /// # Returns
    ///
    /// The checkout URL the customer is redirected to
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Looks up a transaction by the reference given at checkout
    async fn verify_transaction(&self, reference: &str)
        -> Result<TransactionVerification, GatewayError>;

    /// Registers bank details as a transfer recipient
    ///
    /// # Returns
    ///
    /// The recipient code used by later transfers
    async fn create_transfer_recipient(
        &self,
        request: TransferRecipientRequest,
    ) -> Result<String, GatewayError>;

    /// Sends money to a transfer recipient
    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError>;

    /// Requests a full refund of a transaction
    ///
    /// # Arguments
    ///
    /// * `transaction_reference` - The checkout reference of the paid transaction
    async fn create_refund(&self, transaction_reference: &str) -> Result<RefundReceipt, GatewayError>;

    /// Looks up a refund by the gateway's refund reference
    async fn fetch_refund(&self, refund_reference: &str) -> Result<RefundReceipt, GatewayError>;
}

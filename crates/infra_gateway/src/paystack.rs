//! Paystack REST Adapter
//!
//! # Error Handling
//!
//! Responses are mapped onto `GatewayError`:
//! - connect failures, timeouts and 5xx -> `GatewayError::Transport`
//! - 4xx or an envelope with `status: false` -> `GatewayError::Rejected`
//! - a body that does not match the expected shape -> `GatewayError::Decode`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable};
use domain_payments::gateway::{
    CheckoutSession, InitializeTransaction, RefundReceipt, TransactionVerification,
    TransferReceipt, TransferRecipientRequest, TransferRequest,
};
use domain_payments::{GatewayError, PaymentGateway};

use crate::config::PaystackConfig;
use crate::wire::{
    decode, string_field, Envelope, InitializeBody, InitializeData, RecipientBody, RecipientData,
    RefundBody, TransferBody, TransferData, VerifyData,
};

/// Gateway name stored on events and refunds
pub const GATEWAY_NAME: &str = "paystack";

/// HTTP client for the Paystack API
///
/// # Example
///
/// ```rust,ignore
/// use infra_gateway::{PaystackConfig, PaystackGateway};
///
/// let gateway = PaystackGateway::new(PaystackConfig {
///     secret_key: std::env::var("API_GATEWAY_SECRET_KEY")?,
///     ..Default::default()
/// })?;
/// let session = gateway.initialize_transaction(request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PaystackGateway {
    config: PaystackConfig,
    client: Client,
}

impl PaystackGateway {
    /// Builds the adapter with a pooled client honouring the configured timeout
    pub fn new(config: PaystackConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, GatewayError> {
        let url = self.config.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.config.secret_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "Gateway request failed");
            if e.is_timeout() {
                GatewayError::Transport(format!("timed out calling {path}"))
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        debug!(%method, path, status = status.as_u16(), "Gateway responded");

        let envelope = serde_json::from_str::<Envelope>(&text);

        if status.is_server_error() {
            let message = envelope.map(|e| e.message).unwrap_or_else(|_| snippet(&text));
            warn!(path, status = status.as_u16(), message = %message, "Gateway server error");
            return Err(GatewayError::Transport(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        match envelope {
            Ok(envelope) if status.is_success() => envelope.into_data(status.as_u16()),
            Ok(envelope) => Err(GatewayError::rejected(Some(status.as_u16()), envelope.message)),
            Err(_) if !status.is_success() => {
                Err(GatewayError::rejected(Some(status.as_u16()), snippet(&text)))
            }
            Err(e) => Err(GatewayError::Decode(e.to_string())),
        }
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

fn refund_receipt(data: Value) -> Result<RefundReceipt, GatewayError> {
    let reference = string_field(&data, "id")
        .or_else(|| string_field(&data, "reference"))
        .ok_or_else(|| GatewayError::Decode("refund response carries no id".to_string()))?;
    let status = string_field(&data, "status").unwrap_or_else(|| "pending".to_string());
    Ok(RefundReceipt {
        reference,
        status,
        raw: data,
    })
}

impl DomainPort for PaystackGateway {}

#[async_trait]
impl HealthCheckable for PaystackGateway {
    /// Reachability probe; any HTTP answer counts as reachable
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self
            .client
            .get(self.config.url("/bank?perPage=1"))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(response) if response.status().is_server_error() => (
                AdapterHealth::Degraded,
                Some(format!("HTTP {}", response.status().as_u16())),
            ),
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Gateway error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: "paystack-gateway".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn name(&self) -> &'static str {
        GATEWAY_NAME
    }

    #[instrument(skip(self, request), fields(reference = %request.reference, amount_minor = request.amount_minor))]
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<CheckoutSession, GatewayError> {
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_minor,
            currency: request.currency.code(),
            reference: &request.reference,
            callback_url: request.callback_url.as_deref(),
            metadata: &request.metadata,
        };
        let data: InitializeData =
            decode(self.call(Method::POST, "/transaction/initialize", Some(&body)).await?)?;
        Ok(CheckoutSession {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    #[instrument(skip(self))]
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<TransactionVerification, GatewayError> {
        let raw = self
            .call::<()>(Method::GET, &format!("/transaction/verify/{reference}"), None)
            .await?;
        let data: VerifyData = decode(raw.clone())?;
        Ok(TransactionVerification {
            status: data.status,
            reference: data.reference,
            amount_minor: data.amount,
            paid_at: data.paid_at,
            raw,
        })
    }

    #[instrument(skip(self, request), fields(bank_code = %request.bank_code))]
    async fn create_transfer_recipient(
        &self,
        request: TransferRecipientRequest,
    ) -> Result<String, GatewayError> {
        let body = RecipientBody {
            kind: "nuban",
            name: &request.account_name,
            account_number: &request.account_number,
            bank_code: &request.bank_code,
            currency: request.currency.code(),
        };
        let data: RecipientData =
            decode(self.call(Method::POST, "/transferrecipient", Some(&body)).await?)?;
        Ok(data.recipient_code)
    }

    #[instrument(skip(self, request), fields(reference = %request.reference, amount_minor = request.amount_minor))]
    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError> {
        let body = TransferBody {
            source: "balance",
            amount: request.amount_minor,
            currency: request.currency.code(),
            recipient: &request.recipient_code,
            reference: &request.reference,
            reason: &request.reason,
        };
        let data: TransferData = decode(self.call(Method::POST, "/transfer", Some(&body)).await?)?;
        Ok(TransferReceipt {
            transfer_code: data.transfer_code,
            reference: data.reference.unwrap_or(request.reference),
            status: data.status,
        })
    }

    #[instrument(skip(self))]
    async fn create_refund(&self, transaction_reference: &str) -> Result<RefundReceipt, GatewayError> {
        let body = RefundBody {
            transaction: transaction_reference,
        };
        refund_receipt(self.call(Method::POST, "/refund", Some(&body)).await?)
    }

    #[instrument(skip(self))]
    async fn fetch_refund(&self, refund_reference: &str) -> Result<RefundReceipt, GatewayError> {
        refund_receipt(
            self.call::<()>(Method::GET, &format!("/refund/{refund_reference}"), None)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refund_receipt_prefers_id() {
        let receipt = refund_receipt(json!({"id": 118, "status": "pending"})).unwrap();
        assert_eq!(receipt.reference, "118");
        assert_eq!(receipt.status, "pending");
    }

    #[test]
    fn test_refund_receipt_without_reference_is_decode_error() {
        let err = refund_receipt(json!({"status": "pending"})).unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn test_snippet_truncates() {
        assert_eq!(snippet(&"x".repeat(500)).len(), 200);
    }
}

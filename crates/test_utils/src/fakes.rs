//! Scripted gateway and notification fakes
//!
//! `FakeGateway` answers every call from configurable state and counts
//! calls, so tests can assert both outcomes and "no gateway call was made".

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use core_kernel::DomainPort;
use domain_payments::gateway::{
    CheckoutSession, InitializeTransaction, RefundReceipt, TransactionVerification,
    TransferReceipt, TransferRecipientRequest, TransferRequest,
};
use domain_payments::notification::{Notification, NotificationError, NotificationSink};
use domain_payments::{GatewayError, PaymentGateway};

/// Call counters of the fake gateway
#[derive(Debug, Default)]
pub struct GatewayCalls {
    pub initialize: AtomicU32,
    pub verify: AtomicU32,
    pub recipient: AtomicU32,
    pub transfer: AtomicU32,
    pub refund: AtomicU32,
    pub fetch_refund: AtomicU32,
}

impl GatewayCalls {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct GatewayScript {
    verify_status: Option<String>,
    rejected_recipients: HashSet<String>,
    reject_all_transfers: Option<String>,
    refund_statuses: VecDeque<Result<String, String>>,
    default_refund_status: Option<String>,
    reject_refunds: Option<String>,
    transfers: Vec<TransferRequest>,
    checkouts: Vec<InitializeTransaction>,
}

/// Gateway fake with scripted answers
#[derive(Default)]
pub struct FakeGateway {
    script: RwLock<GatewayScript>,
    pub calls: GatewayCalls,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status returned by `verify_transaction` (default "success")
    pub async fn set_verify_status(&self, status: &str) {
        self.script.write().await.verify_status = Some(status.to_string());
    }

    /// Rejects every transfer with the given message
    pub async fn reject_transfers(&self, message: &str) {
        self.script.write().await.reject_all_transfers = Some(message.to_string());
    }

    /// Rejects transfers to one recipient code only
    pub async fn reject_transfers_to(&self, recipient_code: &str) {
        self.script
            .write()
            .await
            .rejected_recipients
            .insert(recipient_code.to_string());
    }

    /// Rejects refund creation with the given message
    pub async fn reject_refunds(&self, message: &str) {
        self.script.write().await.reject_refunds = Some(message.to_string());
    }

    /// Queues the next `fetch_refund` answer
    pub async fn push_refund_status(&self, status: &str) {
        self.script
            .write()
            .await
            .refund_statuses
            .push_back(Ok(status.to_string()));
    }

    /// Queues a transport error as the next `fetch_refund` answer
    pub async fn push_refund_error(&self, message: &str) {
        self.script
            .write()
            .await
            .refund_statuses
            .push_back(Err(message.to_string()));
    }

    /// Answer once the queue is empty (default "pending")
    pub async fn set_default_refund_status(&self, status: &str) {
        self.script.write().await.default_refund_status = Some(status.to_string());
    }

    /// Transfers the gateway accepted
    pub async fn transfers(&self) -> Vec<TransferRequest> {
        self.script.read().await.transfers.clone()
    }

    /// Checkout requests received
    pub async fn checkouts(&self) -> Vec<InitializeTransaction> {
        self.script.read().await.checkouts.clone()
    }
}

impl DomainPort for FakeGateway {}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &'static str {
        "paystack"
    }

    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<CheckoutSession, GatewayError> {
        self.calls.initialize.fetch_add(1, Ordering::SeqCst);
        let session = CheckoutSession {
            authorization_url: format!("https://checkout.test/{}", request.reference),
            access_code: Some("ac_test".to_string()),
            reference: request.reference.clone(),
        };
        self.script.write().await.checkouts.push(request);
        Ok(session)
    }

    async fn verify_transaction(&self, reference: &str) -> Result<TransactionVerification, GatewayError> {
        self.calls.verify.fetch_add(1, Ordering::SeqCst);
        let status = self
            .script
            .read()
            .await
            .verify_status
            .clone()
            .unwrap_or_else(|| "success".to_string());
        Ok(TransactionVerification {
            paid_at: (status == "success").then(Utc::now),
            raw: json!({ "reference": reference, "status": status }),
            status,
            reference: reference.to_string(),
            amount_minor: 0,
        })
    }

    async fn create_transfer_recipient(
        &self,
        request: TransferRecipientRequest,
    ) -> Result<String, GatewayError> {
        self.calls.recipient.fetch_add(1, Ordering::SeqCst);
        Ok(format!("RCP_{}", request.account_number))
    }

    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError> {
        let n = self.calls.transfer.fetch_add(1, Ordering::SeqCst) + 1;
        let mut script = self.script.write().await;
        if let Some(message) = script.reject_all_transfers.clone() {
            return Err(GatewayError::rejected(Some(400), message));
        }
        if script.rejected_recipients.contains(&request.recipient_code) {
            return Err(GatewayError::rejected(Some(400), "Recipient account is invalid"));
        }
        let receipt = TransferReceipt {
            transfer_code: format!("TRF_{n:04}"),
            reference: request.reference.clone(),
            status: "pending".to_string(),
        };
        script.transfers.push(request);
        Ok(receipt)
    }

    async fn create_refund(&self, transaction_reference: &str) -> Result<RefundReceipt, GatewayError> {
        let n = self.calls.refund.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(message) = self.script.read().await.reject_refunds.clone() {
            return Err(GatewayError::rejected(Some(400), message));
        }
        Ok(RefundReceipt {
            reference: format!("RF_{n:04}"),
            status: "pending".to_string(),
            raw: json!({ "transaction": transaction_reference }),
        })
    }

    async fn fetch_refund(&self, refund_reference: &str) -> Result<RefundReceipt, GatewayError> {
        self.calls.fetch_refund.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.write().await;
        let next = script.refund_statuses.pop_front().unwrap_or_else(|| {
            Ok(script
                .default_refund_status
                .clone()
                .unwrap_or_else(|| "pending".to_string()))
        });
        match next {
            Ok(status) => Ok(RefundReceipt {
                reference: refund_reference.to_string(),
                raw: json!({ "status": status }),
                status,
            }),
            Err(message) => Err(GatewayError::Transport(message)),
        }
    }
}

/// Notification sink that records what was sent
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<Notification>>,
    failing: RwLock<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later send fail
    pub async fn fail_sends(&self) {
        *self.failing.write().await = true;
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if *self.failing.read().await {
            return Err(NotificationError("smtp relay unavailable".to_string()));
        }
        self.sent.write().await.push(notification.clone());
        Ok(())
    }
}

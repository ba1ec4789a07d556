//! Shared application state
//!
//! [`Backends`] is the set of adapters a process runs against: Postgres and
//! Paystack in production (see [`crate::wiring`]), in-memory fakes in tests.
//! Every binary builds its orchestrators from the same bundle.

use std::sync::Arc;

use anyhow::Context;

use core_kernel::HealthCheckable;
use domain_marketplace::PricingTable;
use domain_payments::services::{
    CardService, LedgerPorts, MarketplacePorts, PaymentService, PayoutService, RefundPoller,
    RefundService,
};
use domain_payments::{
    NotificationSink, PaymentError, PaymentGateway, RefundQueue, WebhookVerifier,
};

use crate::config::ApiConfig;

/// Adapters behind every port
#[derive(Clone)]
pub struct Backends {
    pub ledger: LedgerPorts,
    pub marketplace: MarketplacePorts,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn NotificationSink>,
    /// Probed by the readiness endpoint
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

impl Backends {
    /// # Errors
    ///
    /// Fails when `gateway_secret_key` is blank, since webhooks could then be forged.
    pub fn payment_service(&self, config: &ApiConfig) -> Result<PaymentService, PaymentError> {
        let service = PaymentService::new(
            self.ledger.clone(),
            self.marketplace.clone(),
            self.gateway.clone(),
            self.notifier.clone(),
            WebhookVerifier::new(config.gateway_secret_key.clone())?,
        );
        Ok(match &config.callback_url {
            Some(url) => service.with_callback_url(url.clone()),
            None => service,
        })
    }

    pub fn payout_service(&self, config: &ApiConfig) -> PayoutService {
        PayoutService::new(
            self.ledger.clone(),
            self.marketplace.clone(),
            self.gateway.clone(),
            config.payout_policy(),
        )
    }

    pub fn refund_service(&self, config: &ApiConfig) -> RefundService {
        RefundService::new(self.ledger.clone(), self.gateway.clone(), config.retry_policy())
    }

    pub fn refund_poller(&self, config: &ApiConfig) -> RefundPoller {
        RefundPoller::new(
            self.ledger.clone(),
            self.marketplace.clone(),
            self.gateway.clone(),
            self.notifier.clone(),
            config.retry_policy(),
        )
    }

    pub fn card_service(&self) -> CardService {
        CardService::new(self.ledger.clone(), self.marketplace.clone(), self.gateway.clone())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub payments: Arc<PaymentService>,
    pub payouts: Arc<PayoutService>,
    pub refunds: Arc<RefundService>,
    pub cards: Arc<CardService>,
    pub marketplace: MarketplacePorts,
    pub refund_queue: Arc<dyn RefundQueue>,
    pub pricing: PricingTable,
    pub health_checks: Arc<Vec<Arc<dyn HealthCheckable>>>,
}

impl AppState {
    /// Builds the orchestrators for the HTTP server
    ///
    /// # Errors
    ///
    /// Fails when the configured currency or pricing is invalid, or when no
    /// gateway secret is configured for webhook verification.
    pub fn new(config: ApiConfig, backends: &Backends) -> anyhow::Result<Self> {
        let pricing = config.pricing().context("invalid pricing configuration")?;
        let payments = backends
            .payment_service(&config)
            .context("API_GATEWAY_SECRET_KEY must be set")?;

        Ok(Self {
            payments: Arc::new(payments),
            payouts: Arc::new(backends.payout_service(&config)),
            refunds: Arc::new(backends.refund_service(&config)),
            cards: Arc::new(backends.card_service()),
            marketplace: backends.marketplace.clone(),
            refund_queue: backends.ledger.refund_queue.clone(),
            pricing,
            health_checks: Arc::new(backends.health_checks.clone()),
            config: Arc::new(config),
        })
    }
}

//! In-memory Adapters
//!
//! Implementations of the ledger, queue and marketplace ports backed by
//! maps behind a `tokio::sync::RwLock`. They enforce the same uniqueness
//! rules as the PostgreSQL schema so orchestrator tests see the same
//! conflicts production would.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use core_kernel::{
    BookingId, CustomerId, DomainPort, JobId, Money, PaymentCardId, PaymentId, PayoutId,
    PortError, ProviderId, RefundId,
};
use domain_marketplace::{
    Booking, BookingPaymentStatus, BookingPort, BookingStatus, Customer, CustomerPort, Provider,
    ProviderPort, ProviderStatus,
};
use domain_payments::{
    CardStore, EventLog, JobStatus, Payment, PaymentCard, PaymentEvent, PaymentLedger,
    PaymentStatus, Payout, PayoutLedger, PayoutStatus, Refund, RefundLedger, RefundPollJob,
    RefundQueue, RefundStatus,
};

/// How long a claimed job stays invisible to other claimers
const CLAIM_LEASE_SECS: i64 = 300;

#[derive(Default)]
struct LedgerState {
    payments: HashMap<PaymentId, Payment>,
    events: Vec<PaymentEvent>,
    refunds: Vec<Refund>,
    payouts: HashMap<PayoutId, Payout>,
    cards: Vec<PaymentCard>,
    jobs: HashMap<JobId, RefundPollJob>,
}

/// In-memory ledger implementing every payments storage port
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, in insertion order
    pub async fn events(&self) -> Vec<PaymentEvent> {
        self.state.read().await.events.clone()
    }

    /// All refunds, in insertion order
    pub async fn refunds(&self) -> Vec<Refund> {
        self.state.read().await.refunds.clone()
    }

    /// All payouts, oldest first
    pub async fn payouts(&self) -> Vec<Payout> {
        let mut payouts: Vec<_> = self.state.read().await.payouts.values().cloned().collect();
        payouts.sort_by_key(|p| p.created_at);
        payouts
    }

    /// All payments
    pub async fn payments(&self) -> Vec<Payment> {
        self.state.read().await.payments.values().cloned().collect()
    }

    /// All queued jobs, oldest first
    pub async fn jobs(&self) -> Vec<RefundPollJob> {
        let mut jobs: Vec<_> = self.state.read().await.jobs.values().cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Moves a job's run time, e.g. to make it due immediately
    pub async fn set_job_run_at(&self, id: JobId, run_at: DateTime<Utc>) {
        if let Some(job) = self.state.write().await.jobs.get_mut(&id) {
            job.run_at = run_at;
        }
    }
}

impl DomainPort for InMemoryLedger {}

#[async_trait]
impl PaymentLedger for InMemoryLedger {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.payments.values().any(|p| p.booking_id == payment.booking_id) {
            return Err(PortError::conflict(format!(
                "payment for booking {} already exists",
                payment.booking_id
            )));
        }
        state.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        self.state
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Payment", id))
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .payments
            .values()
            .find(|p| p.booking_id == booking_id)
            .cloned())
    }

    async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .payments
            .values()
            .find(|p| p.gateway_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        match state.payments.get_mut(&payment.id) {
            Some(existing) => {
                *existing = payment.clone();
                Ok(())
            }
            None => Err(PortError::not_found("Payment", payment.id)),
        }
    }

    async fn list_unsettled_paid(
        &self,
        provider_id: ProviderId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Payment>, PortError> {
        let state = self.state.read().await;
        let settled: Vec<PaymentId> = state
            .payouts
            .values()
            .filter(|p| p.status != PayoutStatus::Failed)
            .flat_map(|p| p.payment_ids.iter().copied())
            .collect();
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.provider_id == provider_id)
            .filter(|p| p.status == PaymentStatus::Paid)
            .filter(|p| p.paid_at.map(|at| at >= since).unwrap_or(false))
            .filter(|p| !settled.contains(&p.id))
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.paid_at);
        Ok(payments)
    }
}

#[async_trait]
impl EventLog for InMemoryLedger {
    async fn append(&self, event: &PaymentEvent) -> Result<bool, PortError> {
        let mut state = self.state.write().await;
        if state.events.iter().any(|e| e.dedupe_key() == event.dedupe_key()) {
            return Ok(false);
        }
        state.events.push(event.clone());
        Ok(true)
    }

    async fn list_for_payment(&self, payment_id: PaymentId) -> Result<Vec<PaymentEvent>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .events
            .iter()
            .filter(|e| e.payment_id == Some(payment_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RefundLedger for InMemoryLedger {
    async fn insert_refund(&self, refund: &Refund) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state
            .refunds
            .iter()
            .any(|r| r.gateway == refund.gateway && r.gateway_ref == refund.gateway_ref)
        {
            return Err(PortError::conflict("refund reference already recorded"));
        }
        state.refunds.push(refund.clone());
        Ok(())
    }

    async fn get_refund(&self, id: RefundId) -> Result<Refund, PortError> {
        self.state
            .read()
            .await
            .refunds
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Refund", id))
    }

    async fn latest_for_payment(&self, payment_id: PaymentId) -> Result<Option<Refund>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .refunds
            .iter()
            .filter(|r| r.payment_id == payment_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn update_status(&self, id: RefundId, status: RefundStatus) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let refund = state
            .refunds
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PortError::not_found("Refund", id))?;
        refund.status = status;
        refund.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl PayoutLedger for InMemoryLedger {
    async fn insert_payout(&self, payout: &Payout) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.payouts.contains_key(&payout.id) {
            return Err(PortError::conflict("payout already exists"));
        }
        state.payouts.insert(payout.id, payout.clone());
        Ok(())
    }

    async fn get_payout(&self, id: PayoutId) -> Result<Payout, PortError> {
        self.state
            .read()
            .await
            .payouts
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Payout", id))
    }

    async fn update_payout(&self, payout: &Payout) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let existing = state
            .payouts
            .get_mut(&payout.id)
            .ok_or_else(|| PortError::not_found("Payout", payout.id))?;
        existing.status = payout.status;
        existing.transfer_code = payout.transfer_code.clone();
        existing.reference = payout.reference.clone();
        existing.failure_reason = payout.failure_reason.clone();
        existing.updated_at = payout.updated_at;
        Ok(())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payout>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .payouts
            .values()
            .find(|p| p.reference.as_deref() == Some(reference) || p.transfer_reference() == reference)
            .cloned())
    }

    async fn find_by_transfer_code(&self, transfer_code: &str) -> Result<Option<Payout>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .payouts
            .values()
            .find(|p| p.transfer_code.as_deref() == Some(transfer_code))
            .cloned())
    }

    async fn is_payment_settled(&self, payment_id: PaymentId) -> Result<bool, PortError> {
        Ok(self
            .state
            .read()
            .await
            .payouts
            .values()
            .any(|p| p.status != PayoutStatus::Failed && p.payment_ids.contains(&payment_id)))
    }

    async fn list_for_provider(&self, provider_id: ProviderId) -> Result<Vec<Payout>, PortError> {
        let mut payouts: Vec<Payout> = self
            .state
            .read()
            .await
            .payouts
            .values()
            .filter(|p| p.provider_id == provider_id)
            .cloned()
            .collect();
        payouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payouts)
    }
}

#[async_trait]
impl CardStore for InMemoryLedger {
    async fn insert_card(&self, card: &PaymentCard) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if card.is_default
            && state
                .cards
                .iter()
                .any(|c| c.provider_id == card.provider_id && c.is_default)
        {
            return Err(PortError::conflict("provider already has a default card"));
        }
        state.cards.push(card.clone());
        Ok(())
    }

    async fn list_cards(&self, provider_id: ProviderId) -> Result<Vec<PaymentCard>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .cards
            .iter()
            .filter(|c| c.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn get_default(&self, provider_id: ProviderId) -> Result<Option<PaymentCard>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .cards
            .iter()
            .find(|c| c.provider_id == provider_id && c.is_default)
            .cloned())
    }

    async fn set_default(
        &self,
        provider_id: ProviderId,
        card_id: PaymentCardId,
    ) -> Result<PaymentCard, PortError> {
        let mut state = self.state.write().await;
        if !state
            .cards
            .iter()
            .any(|c| c.id == card_id && c.provider_id == provider_id)
        {
            return Err(PortError::not_found("PaymentCard", card_id));
        }
        let mut selected = None;
        for card in state.cards.iter_mut().filter(|c| c.provider_id == provider_id) {
            card.is_default = card.id == card_id;
            if card.is_default {
                selected = Some(card.clone());
            }
        }
        selected.ok_or_else(|| PortError::not_found("PaymentCard", card_id))
    }
}

#[async_trait]
impl RefundQueue for InMemoryLedger {
    async fn enqueue(&self, job: &RefundPollJob) -> Result<(), PortError> {
        self.state.write().await.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<RefundPollJob>, PortError> {
        let mut state = self.state.write().await;
        let mut due: Vec<&mut RefundPollJob> = state
            .jobs
            .values_mut()
            .filter(|j| j.status == JobStatus::Pending && j.run_at <= now)
            .collect();
        due.sort_by_key(|j| j.run_at);

        let mut claimed = Vec::new();
        for job in due.into_iter().take(limit as usize) {
            claimed.push(job.clone());
            job.run_at = now + Duration::seconds(CLAIM_LEASE_SECS);
        }
        Ok(claimed)
    }

    async fn reschedule(
        &self,
        id: JobId,
        attempts: u32,
        run_at: DateTime<Utc>,
        last_error: Option<String>,
    ) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let job = state.jobs.get_mut(&id).ok_or_else(|| PortError::not_found("RefundPollJob", id))?;
        job.attempts = attempts;
        job.run_at = run_at;
        job.last_error = last_error;
        Ok(())
    }

    async fn mark_done(&self, id: JobId, attempts: u32) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let job = state.jobs.get_mut(&id).ok_or_else(|| PortError::not_found("RefundPollJob", id))?;
        job.attempts = attempts;
        job.status = JobStatus::Done;
        Ok(())
    }

    async fn mark_stuck(&self, id: JobId, attempts: u32, last_error: String) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let job = state.jobs.get_mut(&id).ok_or_else(|| PortError::not_found("RefundPollJob", id))?;
        job.attempts = attempts;
        job.status = JobStatus::Stuck;
        job.last_error = Some(last_error);
        Ok(())
    }

    async fn list_stuck(&self, limit: u32) -> Result<Vec<RefundPollJob>, PortError> {
        let state = self.state.read().await;
        let mut stuck: Vec<RefundPollJob> = state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Stuck)
            .cloned()
            .collect();
        stuck.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        stuck.truncate(limit as usize);
        Ok(stuck)
    }
}

#[derive(Default)]
struct MarketplaceState {
    bookings: HashMap<BookingId, Booking>,
    providers: HashMap<ProviderId, Provider>,
    customers: HashMap<CustomerId, Customer>,
    payment_status_failures: u32,
}

/// In-memory bookings, providers and customers
#[derive(Default)]
pub struct InMemoryMarketplace {
    state: RwLock<MarketplaceState>,
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_booking(&self, booking: Booking) {
        self.state.write().await.bookings.insert(booking.id, booking);
    }

    pub async fn insert_provider(&self, provider: Provider) {
        self.state.write().await.providers.insert(provider.id, provider);
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.state.write().await.customers.insert(customer.id, customer);
    }

    pub async fn booking(&self, id: BookingId) -> Option<Booking> {
        self.state.read().await.bookings.get(&id).cloned()
    }

    pub async fn provider(&self, id: ProviderId) -> Option<Provider> {
        self.state.read().await.providers.get(&id).cloned()
    }

    /// Removes a customer, to exercise lookup failures
    pub async fn remove_customer(&self, id: CustomerId) {
        self.state.write().await.customers.remove(&id);
    }

    /// Makes the next `count` booking payment-status writes fail with a connection error
    pub async fn fail_payment_status_writes(&self, count: u32) {
        self.state.write().await.payment_status_failures = count;
    }
}

impl DomainPort for InMemoryMarketplace {}

#[async_trait]
impl BookingPort for InMemoryMarketplace {
    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
        self.booking(id)
            .await
            .ok_or_else(|| PortError::not_found("Booking", id))
    }

    async fn set_payment_status(&self, id: BookingId, status: BookingPaymentStatus) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.payment_status_failures > 0 {
            state.payment_status_failures -= 1;
            return Err(PortError::connection("booking store unavailable"));
        }
        let booking = state.bookings.get_mut(&id).ok_or_else(|| PortError::not_found("Booking", id))?;
        booking.payment_status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let booking = state.bookings.get_mut(&id).ok_or_else(|| PortError::not_found("Booking", id))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ProviderPort for InMemoryMarketplace {
    async fn get_provider(&self, id: ProviderId) -> Result<Provider, PortError> {
        self.provider(id)
            .await
            .ok_or_else(|| PortError::not_found("Provider", id))
    }

    async fn list_approved(&self) -> Result<Vec<Provider>, PortError> {
        let mut providers: Vec<Provider> = self
            .state
            .read()
            .await
            .providers
            .values()
            .filter(|p| p.status == ProviderStatus::Approved)
            .cloned()
            .collect();
        providers.sort_by_key(|p| p.created_at);
        Ok(providers)
    }

    async fn add_earnings(&self, id: ProviderId, amount: Money) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let provider = state.providers.get_mut(&id).ok_or_else(|| PortError::not_found("Provider", id))?;
        provider
            .credit_earnings(&amount)
            .map_err(|e| PortError::validation(e.to_string()))
    }
}

#[async_trait]
impl CustomerPort for InMemoryMarketplace {
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        self.state
            .read()
            .await
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Customer", id))
    }
}

//! PostgreSQL Marketplace Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{
    BookingId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, Money, PortError,
    ProviderId,
};
use domain_marketplace::{
    Booking, BookingPaymentStatus, BookingPort, BookingStatus, Customer, CustomerPort, Provider,
    ProviderPort, ProviderStatus,
};

use crate::repositories::marketplace::{BookingRow, ProviderRow};
use crate::repositories::MarketplaceRepository;

use super::{money, ping, status};

/// PostgreSQL-backed implementation of the booking, provider and customer ports
#[derive(Debug, Clone)]
pub struct PostgresMarketplace {
    repository: MarketplaceRepository,
    pool: PgPool,
}

impl PostgresMarketplace {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: MarketplaceRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresMarketplace {}

#[async_trait]
impl HealthCheckable for PostgresMarketplace {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-marketplace-adapter").await
    }
}

#[async_trait]
impl BookingPort for PostgresMarketplace {
    #[instrument(skip(self), fields(booking_id = %id))]
    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
        row_to_booking(self.repository.get_booking(*id.as_uuid()).await?)
    }

    #[instrument(skip(self), fields(booking_id = %id, payment_status = status.as_str()))]
    async fn set_payment_status(
        &self,
        id: BookingId,
        status: BookingPaymentStatus,
    ) -> Result<(), PortError> {
        self.repository
            .set_booking_payment_status(*id.as_uuid(), status.as_str())
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self), fields(booking_id = %id, status = status.as_str()))]
    async fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<(), PortError> {
        self.repository
            .set_booking_status(*id.as_uuid(), status.as_str())
            .await
            .map_err(PortError::from)
    }
}

#[async_trait]
impl ProviderPort for PostgresMarketplace {
    #[instrument(skip(self), fields(provider_id = %id))]
    async fn get_provider(&self, id: ProviderId) -> Result<Provider, PortError> {
        row_to_provider(self.repository.get_provider(*id.as_uuid()).await?)
    }

    #[instrument(skip(self))]
    async fn list_approved(&self) -> Result<Vec<Provider>, PortError> {
        self.repository
            .list_approved_providers()
            .await?
            .into_iter()
            .map(row_to_provider)
            .collect()
    }

    #[instrument(skip(self, amount), fields(provider_id = %id, amount = %amount.amount()))]
    async fn add_earnings(&self, id: ProviderId, amount: Money) -> Result<(), PortError> {
        self.repository
            .add_earnings(*id.as_uuid(), amount.amount())
            .await
            .map_err(PortError::from)
    }
}

#[async_trait]
impl CustomerPort for PostgresMarketplace {
    #[instrument(skip(self), fields(customer_id = %id))]
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        let row = self.repository.get_customer(*id.as_uuid()).await?;
        Ok(Customer {
            id: CustomerId::from_uuid(row.id),
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
        })
    }
}

fn row_to_booking(row: BookingRow) -> Result<Booking, PortError> {
    Ok(Booking {
        id: BookingId::from_uuid(row.id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        provider_id: row.provider_id.map(ProviderId::from_uuid),
        pickup_address: row.pickup_address,
        dropoff_address: row.dropoff_address,
        distance_km: row.distance_km,
        quoted_total: money(row.quoted_total, &row.currency)?,
        status: status("status", &row.status, BookingStatus::parse)?,
        payment_status: status("payment_status", &row.payment_status, BookingPaymentStatus::parse)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_provider(row: ProviderRow) -> Result<Provider, PortError> {
    Ok(Provider {
        id: ProviderId::from_uuid(row.id),
        business_name: row.business_name,
        email: row.email,
        status: status("status", &row.status, ProviderStatus::parse)?,
        earnings: money(row.earnings, &row.currency)?,
        created_at: row.created_at,
    })
}

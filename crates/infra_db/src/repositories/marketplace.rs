//! Bookings, providers and customers
//!
//! These tables belong to the wider marketplace. The payments core reads
//! them and writes back only booking statuses and provider earnings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub distance_km: Decimal,
    pub quoted_total: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProviderRow {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
    pub status: String,
    pub earnings: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

const PROVIDER_COLUMNS: &str = "id, business_name, email, status, earnings, currency, created_at";

/// Repository for the marketplace tables
#[derive(Debug, Clone)]
pub struct MarketplaceRepository {
    pool: PgPool,
}

impl MarketplaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<BookingRow, DatabaseError> {
        sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, customer_id, provider_id, pickup_address, dropoff_address, distance_km,
                   quoted_total, currency, status, payment_status, created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Booking", id))
    }

    pub async fn set_booking_payment_status(&self, id: Uuid, status: &str) -> Result<(), DatabaseError> {
        self.update_booking_column("payment_status", id, status).await
    }

    pub async fn set_booking_status(&self, id: Uuid, status: &str) -> Result<(), DatabaseError> {
        self.update_booking_column("status", id, status).await
    }

    async fn update_booking_column(&self, column: &'static str, id: Uuid, value: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query(&format!(
            "UPDATE bookings SET {column} = $2, updated_at = NOW() WHERE id = $1"
        ))
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Booking", id));
        }
        Ok(())
    }

    pub async fn get_provider(&self, id: Uuid) -> Result<ProviderRow, DatabaseError> {
        sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Provider", id))
    }

    pub async fn list_approved_providers(&self) -> Result<Vec<ProviderRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE status = 'APPROVED' ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Increments earnings in a single statement
    pub async fn add_earnings(&self, id: Uuid, amount: Decimal) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE providers SET earnings = earnings + $2 WHERE id = $1")
            .bind(id)
            .bind(amount)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Provider", id));
        }
        Ok(())
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<CustomerRow, DatabaseError> {
        sqlx::query_as::<_, CustomerRow>(
            "SELECT id, full_name, email, phone FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Customer", id))
    }
}

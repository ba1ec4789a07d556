//! Production adapters: Postgres storage and the Paystack gateway

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use core_kernel::HealthCheckable;

use domain_payments::services::{LedgerPorts, MarketplacePorts};
use domain_payments::TracingNotificationSink;
use infra_db::{
    create_pool, run_migrations, DatabasePool, PostgresLedger, PostgresMarketplace,
    PostgresRefundQueue,
};
use infra_gateway::PaystackGateway;

use crate::config::ApiConfig;
use crate::state::Backends;

/// Connects the pool and optionally applies migrations
pub async fn connect_database(config: &ApiConfig, migrate: bool) -> anyhow::Result<DatabasePool> {
    let pool = create_pool(config.database())
        .await
        .context("failed to create database pool")?;
    if migrate {
        run_migrations(&pool).await.context("failed to run migrations")?;
    }
    Ok(pool)
}

/// Builds the Postgres and Paystack backends over one shared pool
pub fn postgres_backends(config: &ApiConfig, pool: DatabasePool) -> anyhow::Result<Backends> {
    let ledger = Arc::new(PostgresLedger::new(pool.clone()));
    let queue = Arc::new(PostgresRefundQueue::new(pool.clone()));
    let marketplace = Arc::new(PostgresMarketplace::new(pool));
    let gateway = Arc::new(
        PaystackGateway::new(config.gateway()).context("failed to build gateway client")?,
    );

    info!(gateway_url = %config.gateway_base_url, "Backends configured");

    Ok(Backends {
        ledger: LedgerPorts {
            payments: ledger.clone(),
            events: ledger.clone(),
            refunds: ledger.clone(),
            payouts: ledger.clone(),
            cards: ledger.clone(),
            refund_queue: queue.clone(),
        },
        marketplace: MarketplacePorts {
            bookings: marketplace.clone(),
            providers: marketplace.clone(),
            customers: marketplace.clone(),
        },
        gateway: gateway.clone(),
        notifier: Arc::new(TracingNotificationSink),
        health_checks: vec![
            ledger as Arc<dyn HealthCheckable>,
            queue,
            marketplace,
            gateway,
        ],
    })
}

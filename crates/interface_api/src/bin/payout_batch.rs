//! Weekly payout batch
//!
//! Pays every approved provider for settled payments in the batch window.
//! Runs once and exits; scheduling belongs to cron or the orchestrator.

use anyhow::Context;
use chrono::Utc;

use interface_api::telemetry::init_tracing;
use interface_api::wiring::{connect_database, postgres_backends};
use interface_api::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level, config.log_format);

    let pool = connect_database(&config, false).await?;
    let backends = postgres_backends(&config, pool)?;

    let report = backends
        .payout_service(&config)
        .run_weekly_batch(Utc::now())
        .await
        .context("weekly payout batch failed")?;

    tracing::info!(
        providers_considered = report.providers_considered,
        payouts_created = report.payouts_created,
        failures = report.failures,
        skipped = report.skipped,
        total_paid_out = %report.total_paid_out,
        "Weekly payout batch finished"
    );
    Ok(())
}

//! Refund status worker
//!
//! Claims due refund poll jobs, asks the gateway for each refund's status
//! and applies terminal results. Sleeps for `API_WORKER_IDLE_SECS` when no
//! job was due. Run as many replicas as needed; claims are leased.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;

use interface_api::telemetry::{init_tracing, shutdown_signal};
use interface_api::wiring::{connect_database, postgres_backends};
use interface_api::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level, config.log_format);

    let pool = connect_database(&config, false).await?;
    let backends = postgres_backends(&config, pool)?;
    let poller = backends.refund_poller(&config);
    let idle = config.worker_idle();

    tracing::info!(
        batch_size = config.worker_batch_size,
        idle_secs = config.worker_idle_secs,
        "Refund worker started"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let pause = match poller.run_once(Utc::now(), config.worker_batch_size).await {
            Ok(report) if report.claimed > 0 => Duration::ZERO,
            Ok(_) => idle,
            Err(e) => {
                tracing::error!(error = %e, "Refund poll pass failed");
                idle
            }
        };

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    tracing::info!("Refund worker stopped");
    Ok(())
}

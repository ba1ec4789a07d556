//! Movers payments API server
//!
//! # Usage
//!
//! ```bash
//! API_PORT=8080 API_DATABASE_URL=postgres://... API_GATEWAY_SECRET_KEY=sk_test_... \
//!     cargo run --bin movers-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Listen address (default: 0.0.0.0:8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_GATEWAY_SECRET_KEY` - Gateway secret key, also used to check webhook signatures
//! * `API_LOG_LEVEL` / `API_LOG_FORMAT` - `info`, `debug`, ... and `pretty` or `json`

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use interface_api::telemetry::{init_tracing, shutdown_signal};
use interface_api::wiring::{connect_database, postgres_backends};
use interface_api::{create_router, ApiConfig, AppState};

/// Loads configuration, applies migrations and serves until shutdown
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting movers payments API server"
    );

    let pool = connect_database(&config, true).await?;
    let backends = postgres_backends(&config, pool)?;
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid listen address")?;
    let app = create_router(AppState::new(config, &backends)?);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

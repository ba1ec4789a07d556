//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the payments core using SQLx.
//!
//! # Architecture
//!
//! - `repositories` own the SQL and read and write plain row structs
//! - `adapters` implement the domain ports on top of the repositories
//! - `pool` builds the connection pool and applies the migrations
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedger};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/movers")).await?;
//! run_migrations(&pool).await?;
//! let ledger = PostgresLedger::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{PostgresLedger, PostgresMarketplace, PostgresRefundQueue};

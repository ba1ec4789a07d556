//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! marketplace payments test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for bookings, providers and customers
//! - `memory`: In-memory implementations of every storage port
//! - `fakes`: Scripted payment gateway and recording notification sink
//! - `harness`: Wires the in-memory adapters into the orchestrators
//! - `database`: Database test helpers and container management
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod memory;
pub mod fakes;
pub mod harness;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use memory::*;
pub use fakes::*;
pub use harness::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

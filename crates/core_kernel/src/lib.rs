//! Core Kernel - Foundational types shared by the marketplace crates
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic and minor-unit conversion
//! - Strongly-typed identifiers for bookings, payments, refunds and payouts
//! - The port error type and marker traits for adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    BookingId, CustomerId, ProviderId, PaymentId, PaymentEventId,
    RefundId, PayoutId, PaymentCardId, JobId,
};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};

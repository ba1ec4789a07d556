//! Repository implementations
//!
//! Repositories own the SQL. They read and write plain row structs with
//! runtime-checked queries; the adapters in `crate::adapters` translate
//! rows into domain types.

pub mod payments;
pub mod refunds;
pub mod payouts;
pub mod marketplace;

pub use payments::PaymentRepository;
pub use refunds::RefundRepository;
pub use payouts::PayoutRepository;
pub use marketplace::MarketplaceRepository;

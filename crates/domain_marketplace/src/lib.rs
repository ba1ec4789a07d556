//! Marketplace Domain
//!
//! The two-sided side of the system: customers book moves, approved
//! providers carry them out. The payments crate reads bookings through
//! [`BookingPort`] and writes back the booking's payment status.
//!
//! # Booking Lifecycle
//!
//! ```text
//! PENDING -> ACCEPTED -> IN_PROGRESS -> COMPLETED
//!     \          \            \
//!      +----------+------------+--> CANCELLED
//! ```

pub mod booking;
pub mod provider;
pub mod customer;
pub mod pricing;
pub mod ports;
pub mod error;

pub use booking::{Booking, BookingStatus, BookingPaymentStatus};
pub use provider::{Provider, ProviderStatus};
pub use customer::Customer;
pub use pricing::{PricingTable, QuoteRequest, Quote};
pub use ports::{BookingPort, ProviderPort, CustomerPort};
pub use error::MarketplaceError;

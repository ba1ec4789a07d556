//! Payment Gateway Infrastructure
//!
//! REST adapter implementing `domain_payments::PaymentGateway` against a
//! Paystack-style API. Requests carry the secret key as a bearer token and
//! every response is wrapped in a `{status, message, data}` envelope.

pub mod config;
pub mod wire;
pub mod paystack;

pub use config::PaystackConfig;
pub use paystack::PaystackGateway;

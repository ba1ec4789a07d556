//! Request handlers

pub mod health;
pub mod payments;
pub mod payouts;
pub mod cards;
pub mod bookings;
pub mod quotes;
pub mod admin;

//! Customers booking moves

use serde::{Deserialize, Serialize};

use core_kernel::CustomerId;

/// A customer, read-only from the payments side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    /// Used as the payer email on hosted checkout
    pub email: String,
    pub phone: Option<String>,
}

impl Customer {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>, phone: Option<String>) -> Self {
        Self {
            id: CustomerId::new_v7(),
            full_name: full_name.into(),
            email: email.into(),
            phone,
        }
    }
}

//! Quote DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_marketplace::pricing::{Quote, QuoteRequest};

use super::non_negative;

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteEstimateRequest {
    #[validate(custom(function = "non_negative"))]
    pub distance_km: Decimal,
    #[serde(default)]
    #[validate(range(max = 10, message = "at most 10 helpers"))]
    pub helpers: u32,
    #[serde(default)]
    #[validate(range(max = 50, message = "at most 50 floors"))]
    pub floors: u32,
}

impl From<&QuoteEstimateRequest> for QuoteRequest {
    fn from(r: &QuoteEstimateRequest) -> Self {
        QuoteRequest {
            distance_km: r.distance_km,
            helpers: r.helpers,
            floors: r.floors,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub currency: &'static str,
    pub base_fare: Decimal,
    pub distance_charge: Decimal,
    pub helpers_charge: Decimal,
    pub floors_charge: Decimal,
    pub total: Decimal,
}

impl From<Quote> for QuoteResponse {
    fn from(q: Quote) -> Self {
        Self {
            currency: q.total.currency().code(),
            base_fare: q.base_fare.amount(),
            distance_charge: q.distance_charge.amount(),
            helpers_charge: q.helpers_charge.amount(),
            floors_charge: q.floors_charge.amount(),
            total: q.total.amount(),
        }
    }
}

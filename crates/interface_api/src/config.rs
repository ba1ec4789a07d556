//! API configuration
//!
//! Every field can be overridden with an `API_`-prefixed environment
//! variable, e.g. `API_PORT=9090` or `API_PLATFORM_FEE_PERCENT=12.5`.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use core_kernel::{Currency, MoneyError, Rate};
use domain_marketplace::PricingTable;
use domain_payments::services::PayoutPolicy;
use domain_payments::RetryPolicy;
use infra_db::DatabaseConfig;
use infra_gateway::PaystackConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    pub database_max_connections: u32,
    /// Log level, overridden by RUST_LOG
    pub log_level: String,
    pub log_format: LogFormat,

    pub gateway_base_url: String,
    /// Gateway secret key; also the webhook signing key
    pub gateway_secret_key: String,
    pub gateway_timeout_secs: u64,
    /// Where the hosted checkout sends the customer afterwards
    pub callback_url: Option<String>,

    /// ISO 4217 code of the marketplace currency
    pub currency: String,
    pub platform_fee_percent: Decimal,
    pub fee_on_weekly_batch: bool,
    pub payout_batch_window_days: i64,

    pub pricing_base_fare: Decimal,
    pub pricing_per_km: Decimal,
    pub pricing_per_helper: Decimal,
    pub pricing_per_floor: Decimal,

    pub refund_poll_base_delay_secs: u64,
    pub refund_poll_max_delay_secs: u64,
    pub refund_poll_max_attempts: u32,
    pub worker_batch_size: u32,
    pub worker_idle_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        let pricing = PricingTable::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/movers".to_string(),
            database_max_connections: 10,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            gateway_base_url: PaystackConfig::default().base_url,
            gateway_secret_key: String::new(),
            gateway_timeout_secs: 30,
            callback_url: None,
            currency: "NGN".to_string(),
            platform_fee_percent: dec!(10),
            fee_on_weekly_batch: false,
            payout_batch_window_days: 7,
            pricing_base_fare: pricing.base_fare,
            pricing_per_km: pricing.per_km,
            pricing_per_helper: pricing.per_helper,
            pricing_per_floor: pricing.per_floor,
            refund_poll_base_delay_secs: retry.base_delay_secs,
            refund_poll_max_delay_secs: retry.max_delay_secs,
            refund_poll_max_attempts: retry.max_attempts,
            worker_batch_size: 25,
            worker_idle_secs: 15,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn currency(&self) -> Result<Currency, MoneyError> {
        Currency::from_str(&self.currency)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone()).max_connections(self.database_max_connections)
    }

    pub fn gateway(&self) -> PaystackConfig {
        PaystackConfig {
            base_url: self.gateway_base_url.clone(),
            secret_key: self.gateway_secret_key.clone(),
            timeout_secs: self.gateway_timeout_secs,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay_secs: self.refund_poll_base_delay_secs,
            max_delay_secs: self.refund_poll_max_delay_secs,
            max_attempts: self.refund_poll_max_attempts,
        }
    }

    pub fn payout_policy(&self) -> PayoutPolicy {
        PayoutPolicy {
            platform_fee: Rate::from_percentage(self.platform_fee_percent),
            fee_on_weekly_batch: self.fee_on_weekly_batch,
            batch_window_days: self.payout_batch_window_days,
        }
    }

    pub fn pricing(&self) -> Result<PricingTable, MoneyError> {
        Ok(PricingTable {
            currency: self.currency()?,
            base_fare: self.pricing_base_fare,
            per_km: self.pricing_per_km,
            per_helper: self.pricing_per_helper,
            per_floor: self.pricing_per_floor,
        })
    }

    pub fn worker_idle(&self) -> Duration {
        Duration::from_secs(self.worker_idle_secs)
    }
}

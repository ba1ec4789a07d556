//! Request and response bodies of the gateway API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use domain_payments::GatewayError;

/// The `{status, message, data}` wrapper around every response
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Unwraps `data`, treating `status: false` as a rejection
    pub fn into_data(self, http_status: u16) -> Result<Value, GatewayError> {
        if !self.status {
            return Err(GatewayError::rejected(Some(http_status), self.message));
        }
        Ok(self.data)
    }
}

/// Decodes `data` into a typed body
pub fn decode<T: for<'de> Deserialize<'de>>(data: Value) -> Result<T, GatewayError> {
    serde_json::from_value(data).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Reads a field that the API sends either as a string or as a number
pub fn string_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct InitializeBody<'a> {
    pub email: &'a str,
    pub amount: i64,
    pub currency: &'a str,
    pub reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<&'a str>,
    pub metadata: &'a Value,
}

#[derive(Debug, Deserialize)]
pub struct InitializeData {
    pub authorization_url: String,
    #[serde(default)]
    pub access_code: Option<String>,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyData {
    pub status: String,
    pub reference: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RecipientBody<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'a str,
    pub account_number: &'a str,
    pub bank_code: &'a str,
    pub currency: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RecipientData {
    pub recipient_code: String,
}

#[derive(Debug, Serialize)]
pub struct TransferBody<'a> {
    pub source: &'static str,
    pub amount: i64,
    pub currency: &'a str,
    pub recipient: &'a str,
    pub reference: &'a str,
    pub reason: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TransferData {
    pub transfer_code: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RefundBody<'a> {
    pub transaction: &'a str,
}

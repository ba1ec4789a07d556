//! Gateway client configuration

/// Configuration for the Paystack adapter
///
/// ```rust
/// use infra_gateway::PaystackConfig;
///
/// let config = PaystackConfig {
///     secret_key: "sk_test_xxx".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.base_url, "https://api.paystack.co");
/// ```
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// Base URL of the API, without a trailing slash
    pub base_url: String,

    /// Secret key, sent as a bearer token and used to sign webhooks
    pub secret_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl PaystackConfig {
    /// Joins a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = PaystackConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.url("/transfer"), "http://localhost:9000/transfer");
        assert_eq!(config.url("refund/RF_1"), "http://localhost:9000/refund/RF_1");
    }
}

//! simPRO adapter configuration.

use std::time::Duration;

/// Configuration for the simPRO inventory adapter.
#[derive(Clone)]
pub struct SimproConfig {
    /// API root, e.g. `https://acme.simprosuite.com/api/v1.0`.
    pub base_url: String,
    /// OAuth token endpoint.
    pub token_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Company every path is scoped to.
    pub company_id: u64,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// How long before its stated expiry a token is treated as expired.
    pub token_refresh_margin: Duration,
}

impl SimproConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        company_id: u64,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            company_id,
            timeout: Duration::from_secs(30),
            token_refresh_margin: Duration::from_secs(300),
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the token refresh margin.
    #[must_use]
    pub const fn with_token_refresh_margin(mut self, margin: Duration) -> Self {
        self.token_refresh_margin = margin;
        self
    }

    /// Path of a company-scoped resource, relative to the API root.
    #[must_use]
    pub fn company_path(&self, resource: &str) -> String {
        format!(
            "/companies/{}/{}",
            self.company_id,
            resource.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for SimproConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimproConfig")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("company_id", &self.company_id)
            .field("timeout", &self.timeout)
            .field("token_refresh_margin", &self.token_refresh_margin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimproConfig {
        SimproConfig::new(
            "https://acme.simprosuite.com/api/v1.0/",
            "https://acme.simprosuite.com/oauth2/token",
            "client",
            "secret",
            2,
        )
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.base_url, "https://acme.simprosuite.com/api/v1.0");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.token_refresh_margin, Duration::from_secs(300));
    }

    #[test]
    fn company_path_is_scoped() {
        assert_eq!(
            config().company_path("/vendorOrders/5/receipts/"),
            "/companies/2/vendorOrders/5/receipts/"
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("[REDACTED]"));
    }
}

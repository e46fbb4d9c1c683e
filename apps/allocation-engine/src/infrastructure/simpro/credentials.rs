//! OAuth client-credentials token cache.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use tokio::sync::Mutex;

use super::api_types::TokenResponse;
use super::config::SimproConfig;
use super::error::SimproError;
use crate::observability::record_token_refresh;

/// Token lifetime assumed when the token endpoint does not state one.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A bearer token and the moment it stops being used.
#[derive(Clone)]
pub struct Credential {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Check the token can still be used at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// When the token stops being used.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Obtains and caches API tokens.
///
/// The cache lock is held across the token exchange, so concurrent callers
/// wait for one refresh instead of each starting their own.
#[derive(Debug)]
pub struct CredentialManager {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_margin: TimeDelta,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<Credential>>,
}

impl CredentialManager {
    /// Create a manager using the wall clock.
    #[must_use]
    pub fn new(client: Client, config: &SimproConfig) -> Self {
        Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_margin: TimeDelta::from_std(config.token_refresh_margin)
                .unwrap_or_else(|_| TimeDelta::zero()),
            clock: Arc::new(SystemClock),
            cache: Mutex::new(None),
        }
    }

    /// Use a different clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a usable token, exchanging credentials when the cached one is
    /// missing, expired or `force_refresh` is set.
    ///
    /// # Errors
    ///
    /// Returns `SimproError::Auth` if the exchange fails. It is not retried.
    pub async fn get_token(&self, force_refresh: bool) -> Result<String, SimproError> {
        let mut cache = self.cache.lock().await;

        let now = self.clock.now();
        if let Some(credential) = cache
            .as_ref()
            .filter(|c| !force_refresh && c.is_valid_at(now))
        {
            return Ok(credential.access_token.clone());
        }

        *cache = None;
        tracing::info!(forced = force_refresh, "Refreshing API token");

        let credential = self.exchange().await?;
        tracing::info!(expires_at = %credential.expires_at, "API token refreshed");
        let token = credential.access_token.clone();
        *cache = Some(credential);
        Ok(token)
    }

    /// Currently cached credential, if any.
    pub async fn cached(&self) -> Option<Credential> {
        self.cache.lock().await.clone()
    }

    async fn exchange(&self) -> Result<Credential, SimproError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                record_token_refresh("error");
                tracing::warn!(error = %e, "Token refresh error");
                SimproError::Auth(format!("Token refresh failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            record_token_refresh("rejected");
            tracing::warn!(status = status.as_u16(), body = %body, "Token refresh rejected");
            return Err(SimproError::Auth(format!(
                "Failed to get token: {}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            record_token_refresh("error");
            SimproError::Auth(format!("Token response unreadable: {e}"))
        })?;
        record_token_refresh("success");

        let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let lifetime = TimeDelta::try_seconds(i64::try_from(expires_in).unwrap_or(i64::MAX / 1000))
            .unwrap_or_else(TimeDelta::zero)
            - self.refresh_margin;

        Ok(Credential {
            access_token: token.access_token,
            expires_at: self.clock.now() + lifetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct ManualClock(StdMutex<DateTime<Utc>>);

    impl ManualClock {
        fn new() -> Self {
            Self(StdMutex::new(Utc::now()))
        }

        fn advance(&self, seconds: i64) {
            let mut now = self.0.lock().unwrap();
            *now += TimeDelta::seconds(seconds);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn manager(server: &MockServer, clock: Arc<ManualClock>) -> CredentialManager {
        let config = SimproConfig::new(
            server.uri(),
            format!("{}/oauth2/token", server.uri()),
            "client",
            "secret",
            0,
        );
        CredentialManager::new(Client::new(), &config).with_clock(clock)
    }

    fn token_body(token: &str, expires_in: Option<u64>) -> serde_json::Value {
        match expires_in {
            Some(secs) => serde_json::json!({"access_token": token, "expires_in": secs}),
            None => serde_json::json!({"access_token": token}),
        }
    }

    #[tokio::test]
    async fn caches_token_until_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", Some(3600))))
            .expect(1)
            .mount(&server)
            .await;
        let manager = manager(&server, Arc::new(ManualClock::new()));

        assert_eq!(manager.get_token(false).await.unwrap(), "abc");
        assert_eq!(manager.get_token(false).await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn refreshes_inside_margin() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", Some(600))))
            .expect(2)
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, Arc::clone(&clock));

        manager.get_token(false).await.unwrap();
        clock.advance(299);
        manager.get_token(false).await.unwrap();
        clock.advance(2);
        manager.get_token(false).await.unwrap();
    }

    #[tokio::test]
    async fn missing_expires_in_defaults_to_an_hour() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", None)))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, Arc::clone(&clock));
        let before = clock.now();

        manager.get_token(false).await.unwrap();

        let cached = manager.cached().await.unwrap();
        assert_eq!(cached.expires_at() - before, TimeDelta::seconds(3300));
    }

    #[tokio::test]
    async fn force_refresh_skips_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", Some(3600))))
            .expect(2)
            .mount(&server)
            .await;
        let manager = manager(&server, Arc::new(ManualClock::new()));

        manager.get_token(false).await.unwrap();
        manager.get_token(true).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_exchange_is_auth_error_and_clears_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", Some(3600))))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;
        let manager = manager(&server, Arc::new(ManualClock::new()));

        manager.get_token(false).await.unwrap();
        let err = manager.get_token(true).await.unwrap_err();

        assert_eq!(err, SimproError::Auth("Failed to get token: 401".to_string()));
        assert!(manager.cached().await.is_none());
    }
}

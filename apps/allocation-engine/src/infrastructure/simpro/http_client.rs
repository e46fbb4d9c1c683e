//! HTTP client wrapper with token refresh and a single retry.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use super::config::SimproConfig;
use super::credentials::CredentialManager;
use super::error::SimproError;
use crate::observability::record_remote_call;

/// Attempts per logical call: the first, plus one retry after a 401 or a
/// transport failure.
const MAX_ATTEMPTS: u32 = 2;

/// Raw response of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl RemoteResponse {
    /// Check for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTP client for the simPRO API.
#[derive(Debug, Clone)]
pub struct SimproHttpClient {
    client: Client,
    base_url: String,
    credentials: Arc<CredentialManager>,
}

impl SimproHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &SimproConfig) -> Result<Self, SimproError> {
        let client = Self::build_client(config)?;
        let credentials = Arc::new(CredentialManager::new(client.clone(), config));
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            credentials,
        })
    }

    fn build_client(config: &SimproConfig) -> Result<Client, SimproError> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(SimproError::InvalidConfig(
                "client_id and client_secret are required".to_string(),
            ));
        }
        Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SimproError::InvalidConfig(e.to_string()))
    }

    /// Send an authenticated request.
    ///
    /// A 401 on the first attempt forces a token refresh and one retry; a
    /// transport failure is retried once. Every other status is returned
    /// untouched.
    #[tracing::instrument(skip(self, method, body), fields(method = %method))]
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<RemoteResponse, SimproError> {
        let url = format!("{}{path}", self.base_url);
        let mut force_refresh = false;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let token = self.credentials.get_token(force_refresh).await?;

            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(token)
                .header(reqwest::header::ACCEPT, "application/json");
            if let Some(b) = body {
                request = request.json(b);
            }

            let started = Instant::now();
            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    record_remote_call(method.as_str(), "error", started.elapsed().as_secs_f64());
                    if attempt < MAX_ATTEMPTS {
                        tracing::warn!(error = %e, attempt, "Request failed, retrying");
                        continue;
                    }
                    return Err(SimproError::Network {
                        endpoint: path.to_string(),
                        message: e.to_string(),
                    });
                }
            };

            let status = response.status();
            record_remote_call(
                method.as_str(),
                status.as_str(),
                started.elapsed().as_secs_f64(),
            );

            if status == StatusCode::UNAUTHORIZED && attempt < MAX_ATTEMPTS {
                tracing::info!("Got 401, forcing token refresh");
                force_refresh = true;
                continue;
            }

            let body = response.text().await.map_err(|e| SimproError::Network {
                endpoint: path.to_string(),
                message: e.to_string(),
            })?;
            return Ok(RemoteResponse {
                status: status.as_u16(),
                body,
            });
        }
    }

    /// GET a resource and decode it.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SimproError> {
        let response = self.call(Method::GET, path, None).await?;
        let response = Self::require_success(response, path, None)?;
        Self::decode(&response, path)
    }

    /// Send a JSON body, requiring a 2xx response.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<RemoteResponse, SimproError> {
        let response = self.call(method, path, Some(body)).await?;
        Self::require_success(response, path, Some(body))
    }

    fn require_success(
        response: RemoteResponse,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<RemoteResponse, SimproError> {
        if response.is_success() {
            return Ok(response);
        }
        tracing::warn!(
            status = response.status,
            endpoint = path,
            body = %response.body,
            "Remote call rejected"
        );
        Err(SimproError::Status {
            status: response.status,
            endpoint: path.to_string(),
            request_payload: body.map(ToString::to_string),
            body: response.body,
        })
    }

    fn decode<T: DeserializeOwned>(response: &RemoteResponse, path: &str) -> Result<T, SimproError> {
        let text = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(text).map_err(|e| SimproError::JsonParse {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}

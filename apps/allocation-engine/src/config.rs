//! Configuration module for the allocation engine.
//!
//! Loads a YAML file, interpolates environment variables into it and
//! validates the result before any component is built from it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use allocation_engine::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("deploy/config.yaml"))?;
//!
//! println!("HTTP port: {}", config.server.http_port);
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::dto::StorageLocationDto;
use crate::application::use_cases::RoutingConfig;
use crate::domain::allocation::DEFAULT_SERVICE_KEYWORDS;
use crate::domain::shared::StorageDeviceId;
use crate::infrastructure::simpro::SimproConfig;
use crate::observability::{LogFormat, MetricsConfig, TracingConfig};
use crate::resilience::PollPolicy;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ALLOCATION_CONFIG";

/// Config file used when neither an explicit path nor `ALLOCATION_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// simPRO connection.
    pub simpro: SimproSection,
    /// Allocation routing settings.
    pub allocation: AllocationSection,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Storage devices staff can pick as a relocation source or destination.
    #[serde(default)]
    pub storage_locations: Vec<StorageLocationEntry>,
}

impl Config {
    /// Storage locations as served by `GET /api/storage-locations`.
    #[must_use]
    pub fn storage_location_list(&self) -> Vec<StorageLocationDto> {
        self.storage_locations
            .iter()
            .map(|entry| StorageLocationDto {
                id: StorageDeviceId::new(entry.id),
                name: entry.name.clone(),
            })
            .collect()
    }
}

/// One configured storage device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageLocationEntry {
    /// simPRO storage device id.
    pub id: u64,
    /// Name shown to staff.
    pub name: String,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port for REST endpoints.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl ServerConfig {
    /// Socket address the HTTP server listens on.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the bind address is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.http_port)
            .parse()
            .map_err(|e| {
                ConfigError::ValidationError(format!(
                    "server.bind_address '{}' is invalid: {e}",
                    self.bind_address
                ))
            })
    }
}

const fn default_http_port() -> u16 {
    8000
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// simPRO connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SimproSection {
    /// API base URL, e.g. `https://acme.simprosuite.com/api/v1.0`.
    pub base_url: String,
    /// OAuth2 token endpoint.
    pub token_url: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Company the engine works in.
    #[serde(default)]
    pub company_id: u64,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Seconds before expiry at which a cached token is refreshed.
    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,
}

impl std::fmt::Debug for SimproSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimproSection")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("company_id", &self.company_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
            .finish()
    }
}

impl SimproSection {
    /// Build the adapter configuration.
    #[must_use]
    pub fn to_simpro_config(&self) -> SimproConfig {
        SimproConfig::new(
            &self.base_url,
            &self.token_url,
            &self.client_id,
            &self.client_secret,
            self.company_id,
        )
        .with_timeout(Duration::from_secs(self.timeout_secs))
        .with_token_refresh_margin(Duration::from_secs(self.token_refresh_margin_secs))
    }
}

const fn default_timeout_secs() -> u64 {
    30
}
const fn default_token_refresh_margin_secs() -> u64 {
    300
}

/// Allocation routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSection {
    /// Storage device holding received stock before it is put away.
    pub stock_holding_device_id: u64,
    /// Vendor order status meaning "goods received".
    pub goods_received_status_id: u64,
    /// Wait after each receipt flag change, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Polling for stock to appear in the holding device.
    #[serde(default)]
    pub stock_check: StockCheckConfig,
    /// Description keywords marking a line as a service line.
    #[serde(default = "default_service_keywords")]
    pub service_keywords: Vec<String>,
}

impl AllocationSection {
    /// Build the router configuration.
    #[must_use]
    pub fn to_routing_config(&self) -> RoutingConfig {
        RoutingConfig::new(
            StorageDeviceId::new(self.stock_holding_device_id),
            self.goods_received_status_id,
        )
        .with_settle_delay(Duration::from_millis(self.settle_delay_ms))
        .with_service_keywords(self.service_keywords.clone())
    }
}

const fn default_settle_delay_ms() -> u64 {
    3000
}
fn default_service_keywords() -> Vec<String> {
    DEFAULT_SERVICE_KEYWORDS
        .iter()
        .map(|k| (*k).to_string())
        .collect()
}

/// Stock availability polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCheckConfig {
    /// Re-reads after the first one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first re-read in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Cap on any single delay in milliseconds.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Growth factor between delays.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Jitter factor (0.0 - 1.0).
    #[serde(default)]
    pub jitter_factor: f64,
}

impl Default for StockCheckConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            interval_ms: default_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            multiplier: default_multiplier(),
            jitter_factor: 0.0,
        }
    }
}

impl StockCheckConfig {
    /// Convert to a poll policy.
    #[must_use]
    pub const fn to_poll_policy(&self) -> PollPolicy {
        PollPolicy::exponential(
            self.max_retries,
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.max_interval_ms),
            self.multiplier,
        )
        .with_jitter(self.jitter_factor)
    }
}

const fn default_max_retries() -> u32 {
    3
}
const fn default_interval_ms() -> u64 {
    3000
}
const fn default_max_interval_ms() -> u64 {
    30_000
}
const fn default_multiplier() -> f64 {
    1.0
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ObservabilityConfig {
    /// Build the log setup.
    #[must_use]
    pub fn to_tracing_config(&self) -> TracingConfig {
        TracingConfig {
            log_level: self.log_level.clone(),
            format: self.log_format,
        }
    }
}

fn default_log_level() -> String {
    "allocation_engine=info,tower_http=info".to_string()
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSection {
    /// Enable the metrics exporter.
    #[serde(default)]
    pub enabled: bool,
    /// Address of the `/metrics` listener.
    #[serde(default = "default_metrics_listen_addr")]
    pub listen_addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_listen_addr(),
        }
    }
}

impl MetricsSection {
    /// Build the exporter configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the listen address does not parse.
    pub fn to_metrics_config(&self) -> Result<MetricsConfig, ConfigError> {
        let addr: SocketAddr = self.listen_addr.parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "observability.metrics.listen_addr '{}' is invalid: {e}",
                self.listen_addr
            ))
        })?;
        Ok(MetricsConfig::with_addr(addr))
    }
}

fn default_metrics_listen_addr() -> String {
    "0.0.0.0:9090".to_string()
}

// ============================================
// Configuration Loading
// ============================================

/// Path of the config file: explicit path, then `ALLOCATION_CONFIG`, then `config.yaml`.
#[must_use]
pub fn config_path(path: Option<&str>) -> String {
    path.map(str::to_string)
        .or_else(|| {
            std::env::var(CONFIG_PATH_ENV)
                .ok()
                .filter(|p| !p.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = config_path(path);

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

fn require(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.http_port == 0 {
        return Err(ConfigError::ValidationError(
            "server.http_port must be non-zero".to_string(),
        ));
    }
    config.server.socket_addr()?;

    let simpro = &config.simpro;
    require(&simpro.base_url, "simpro.base_url")?;
    require(&simpro.token_url, "simpro.token_url")?;
    require(&simpro.client_id, "simpro.client_id")?;
    require(&simpro.client_secret, "simpro.client_secret")?;
    if simpro.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "simpro.timeout_secs must be positive".to_string(),
        ));
    }

    let allocation = &config.allocation;
    if allocation.stock_holding_device_id == 0 {
        return Err(ConfigError::ValidationError(
            "allocation.stock_holding_device_id must be set".to_string(),
        ));
    }
    if allocation.goods_received_status_id == 0 {
        return Err(ConfigError::ValidationError(
            "allocation.goods_received_status_id must be set".to_string(),
        ));
    }

    let poll = &allocation.stock_check;
    if poll.multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "allocation.stock_check.multiplier must be at least 1.0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&poll.jitter_factor) {
        return Err(ConfigError::ValidationError(
            "allocation.stock_check.jitter_factor must be between 0.0 and 1.0".to_string(),
        ));
    }
    if poll.max_interval_ms < poll.interval_ms {
        return Err(ConfigError::ValidationError(
            "allocation.stock_check.max_interval_ms must not be below interval_ms".to_string(),
        ));
    }

    if config.observability.metrics.enabled {
        config.observability.metrics.to_metrics_config()?;
    }

    let mut seen = std::collections::HashSet::new();
    for location in &config.storage_locations {
        if location.id == 0 {
            return Err(ConfigError::ValidationError(
                "storage_locations[].id must be set".to_string(),
            ));
        }
        require(&location.name, "storage_locations[].name")?;
        if !seen.insert(location.id) {
            return Err(ConfigError::ValidationError(format!(
                "storage_locations lists device {} twice",
                location.id
            )));
        }
    }

    Ok(())
}

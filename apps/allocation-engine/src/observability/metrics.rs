//! Prometheus metrics for the allocation engine.
//!
//! Covers allocation outcomes, remote ERP calls, token refreshes and stock
//! polling.
//!
//! # Example
//!
//! ```ignore
//! use allocation_engine::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config)?;
//!
//! record_allocation_result("stock_transfer", true);
//! ```

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for latency measurements (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            // Remote calls take tens of milliseconds, whole requests tens of seconds
            latency_buckets: vec![
                0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Allocation Metrics
// ============================================================================

/// Record the result of one line item.
///
/// # Arguments
///
/// * `method` - Method tag (e.g., `stock_transfer`, `skipped_zero_stock`)
/// * `success` - Whether the line succeeded
pub fn record_allocation_result(method: &str, success: bool) {
    counter!(
        "allocation_results_total",
        "method" => method.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Record a completed allocation request.
///
/// # Arguments
///
/// * `outcome` - `success`, `failed` or `rejected`
/// * `latency_seconds` - Wall time of the whole request
pub fn record_allocation_request(outcome: &str, latency_seconds: f64) {
    counter!(
        "allocation_requests_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!("allocation_request_duration_seconds").record(latency_seconds);
}

/// Record an items-received flag change on a receipt.
pub fn record_receipt_flag(outcome: &str) {
    counter!(
        "allocation_receipt_flags_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a completed relocation request.
///
/// # Arguments
///
/// * `outcome` - `success`, `failed` or `rejected`
/// * `latency_seconds` - Wall time of the whole request
pub fn record_relocation_request(outcome: &str, latency_seconds: f64) {
    counter!(
        "relocation_requests_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!("relocation_request_duration_seconds").record(latency_seconds);
}

/// Record a stock re-read while waiting for stock to settle.
pub fn record_stock_poll_retry() {
    counter!("allocation_stock_poll_retries_total").increment(1);
}

// ============================================================================
// Remote ERP Metrics
// ============================================================================

/// Record one HTTP exchange with the ERP.
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `status` - Status code, or `transport_error`
/// * `latency_seconds` - Round trip time
pub fn record_remote_call(method: &str, status: &str, latency_seconds: f64) {
    counter!(
        "simpro_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "simpro_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(latency_seconds);
}

/// Record a token exchange.
///
/// # Arguments
///
/// * `outcome` - `success` or `failure`
pub fn record_token_refresh(outcome: &str) {
    counter!(
        "simpro_token_refreshes_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

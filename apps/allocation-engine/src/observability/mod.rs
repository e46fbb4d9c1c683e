//! Observability module for metrics and logging.
//!
//! Prometheus metrics export and `tracing` subscriber setup.

mod logging;
mod metrics;

pub use logging::{LogFormat, TracingConfig, TracingError, build_filter, init_tracing};
pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_allocation_request,
    record_allocation_result, record_receipt_flag, record_relocation_request, record_remote_call,
    record_stock_poll_retry, record_token_refresh,
};

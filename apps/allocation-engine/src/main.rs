//! Allocation Engine Binary
//!
//! Starts the storeroom allocation HTTP service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin allocation-engine
//! ```
//!
//! # Environment Variables
//!
//! - `ALLOCATION_CONFIG`: Path to the YAML config (default: config.yaml)
//! - `RUST_LOG`: Log filter, overrides `observability.log_level`
//!
//! Any `${VAR}` referenced from the config file, typically the simPRO
//! credentials, is read from the environment or a `.env` file.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;

use allocation_engine::config::{Config, config_path, load_config};
use allocation_engine::infrastructure::http::{AppState, create_router};
use allocation_engine::infrastructure::persistence::TracingAllocationLog;
use allocation_engine::infrastructure::simpro::SimproInventoryAdapter;
use allocation_engine::observability::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let path = config_path(None);
    let config = load_config(Some(&path)).with_context(|| format!("loading {path}"))?;

    init_tracing(&config.observability.to_tracing_config())
        .context("initialising tracing")?;

    tracing::info!(config = %path, "Starting allocation engine");
    log_config(&config);

    if config.observability.metrics.enabled {
        let metrics = config.observability.metrics.to_metrics_config()?;
        init_metrics(&metrics).context("starting metrics exporter")?;
        tracing::info!(listen_addr = %metrics.listen_addr, "Metrics exporter started");
    }

    let inventory = Arc::new(
        SimproInventoryAdapter::new(config.simpro.to_simpro_config())
            .context("building simPRO client")?,
    );
    let log = Arc::new(TracingAllocationLog::new());

    let state = AppState::new(
        inventory,
        log,
        config.allocation.stock_check.to_poll_policy(),
        config.allocation.to_routing_config(),
        env!("CARGO_PKG_VERSION"),
    )
    .with_storage_locations(config.storage_location_list());
    let app = create_router(state);

    let http_addr = config.server.socket_addr()?;
    tracing::info!(%http_addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  POST /api/allocate");
    tracing::info!("  GET  /api/po/{{po_number}}");
    tracing::info!("  GET  /api/storage/{{storage_id}}/stock");
    tracing::info!("  GET  /api/storage-locations");
    tracing::info!("  POST /api/relocate");
    tracing::info!("  GET  /api/stock-pick-list");

    let listener = TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("binding {http_addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Allocation engine stopped");
    Ok(())
}

fn log_config(config: &Config) {
    tracing::info!(
        base_url = %config.simpro.base_url,
        company_id = config.simpro.company_id,
        stock_holding_device_id = config.allocation.stock_holding_device_id,
        goods_received_status_id = config.allocation.goods_received_status_id,
        settle_delay_ms = config.allocation.settle_delay_ms,
        stock_check_retries = config.allocation.stock_check.max_retries,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    tracing::info!("Waiting for in-flight allocations to finish");
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stratum_requests_total` (counter): requests through the engine, by
//!   status class
//! - `stratum_request_duration_seconds` (histogram): engine latency
//! - `stratum_forwarded_requests_total` (counter): requests sent upstream
//! - `stratum_upstream_failures_total` (counter): failed upstream calls
//! - `stratum_handler_panics_total` (counter): recovered handler panics
//! - `stratum_admin_mutations_total` (counter): admin API writes
//!
//! # Design Decisions
//! - Prometheus exposition on a dedicated listener, enabled via config

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use thiserror::Error;

use crate::config::schema::ObservabilityConfig;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metrics listen address {addr:?}")]
    InvalidAddr { addr: String },
    #[error("failed to install metrics exporter: {0}")]
    Exporter(#[from] BuildError),
}

/// Install the Prometheus exporter if metrics are enabled.
pub fn init(config: &ObservabilityConfig) -> Result<(), MetricsError> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let raw = format!("{}:{}", config.metrics_host, config.metrics_port);
    let addr: SocketAddr = raw
        .parse()
        .map_err(|_| MetricsError::InvalidAddr { addr: raw })?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}

/// Record one request handled by the engine.
pub fn record_request(status: u16, elapsed: Duration) {
    let class = match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    };
    metrics::counter!("stratum_requests_total", "class" => class).increment(1);
    metrics::histogram!("stratum_request_duration_seconds").record(elapsed.as_secs_f64());
}

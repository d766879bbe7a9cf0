//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by mode and status
//! - `relay_request_duration_seconds` (histogram): latency by mode
//! - `relay_render_failures_total` (counter): failed browser renders
//! - `relay_upstream_errors_total` (counter): forward attempts with no upstream response
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(mode: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "mode" => mode,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_render_failure() {
    metrics::counter!("relay_render_failures_total").increment(1);
}

pub fn record_upstream_error() {
    metrics::counter!("relay_upstream_errors_total").increment(1);
}

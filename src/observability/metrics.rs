//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed requests by resource, status
//! - `relay_request_duration_seconds` (histogram): latency by resource
//! - `relay_upstream_failures_total` (counter): failed relays by resource

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished relay.
pub fn record_relay(resource: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "resource" => resource,
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("relay_request_duration_seconds", "resource" => resource)
        .record(start.elapsed().as_secs_f64());
}

/// Record a relay that ended in the generic error path.
pub fn record_relay_failure(resource: &'static str) {
    metrics::counter!("relay_upstream_failures_total", "resource" => resource).increment(1);
}

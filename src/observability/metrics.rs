//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): total requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//!
//! Recording is cheap (atomic updates) and becomes a no-op when no exporter
//! is installed, so library users are free to skip [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener. Called once by the
/// binary.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics endpoint started"),
        Err(error) => tracing::error!(%error, "failed to install Prometheus exporter"),
    }
}

/// Record the outcome of one proxied request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    counter!(
        "proxy_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "method" => method.to_owned()).record(elapsed);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, target
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_rate_limited_total` (counter): denied attempts by reason
//! - `gateway_upstream_failures_total` (counter): unreachable upstreams by target
//!
//! # Design Decisions
//! - `metrics` facade with a Prometheus exporter on a dedicated address
//! - Low-cardinality labels only (method, status class, target name)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(e) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter");
        return;
    }
    tracing::info!(address = %addr, "Metrics exporter listening");
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("target", target.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a rate-limited attempt.
pub fn record_rate_limited(reason: &str) {
    metrics::counter!("gateway_rate_limited_total", "reason" => reason.to_string()).increment(1);
}

/// Record an unreachable upstream.
pub fn record_upstream_failure(target: &str) {
    metrics::counter!("gateway_upstream_failures_total", "target" => target.to_string())
        .increment(1);
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, status
//! - `router_request_duration_seconds` (histogram): latency distribution
//! - `router_unmapped_errors_total` (counter): errors no mapping handled
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for method and status code only; paths are unbounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ServerError;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), ServerError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    describe_counter!("router_requests_total", "Total number of HTTP requests handled");
    describe_histogram!(
        "router_request_duration_seconds",
        "Request handling duration in seconds"
    );
    describe_counter!(
        "router_unmapped_errors_total",
        "Handler errors answered with a generic 500"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "router_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `scipnet_dispatch_total` (counter): dispatches by method, kind, status
//! - `scipnet_dispatch_duration_seconds` (histogram): dispatch latency
//! - `scipnet_session_lookups_total` (counter): session gate outcomes
//! - `scipnet_rpc_errors_total` (counter): JSON-RPC envelope failures

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::http::request::Method;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed dispatch.
pub fn record_dispatch(method: Method, kind: &'static str, status: u16, start: Instant) {
    counter!(
        "scipnet_dispatch_total",
        "method" => method.as_str(),
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("scipnet_dispatch_duration_seconds", "method" => method.as_str(), "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

/// Record a session gate outcome (`resolved`, `rejected`, `absent`).
pub fn record_session_lookup(outcome: &'static str) {
    counter!("scipnet_session_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a rejected JSON-RPC envelope.
pub fn record_rpc_error(code: i64) {
    counter!("scipnet_rpc_errors_total", "code" => code.to_string()).increment(1);
}

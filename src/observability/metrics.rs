//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bff_requests_total` (counter): requests by method, route, status
//! - `bff_request_duration_seconds` (histogram): handler latency
//! - `bff_upstream_requests_total` (counter): upstream calls by method, outcome
//! - `bff_upstream_duration_seconds` (histogram): upstream latency
//! - `bff_sale_candidates_total` (counter): sale payload attempts by shape, outcome
//! - `bff_rate_limited_total` (counter): storefront rejections
//! - `bff_logout_total` (counter): logouts, split into leader and joined
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Route labels use the matched route template, never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("bff_requests_total", &labels[..]).increment(1);
    metrics::histogram!("bff_request_duration_seconds", &labels[..]).record(start.elapsed().as_secs_f64());
}

pub fn record_upstream(method: &str, outcome: &str, start: Instant) {
    let labels = [("method", method.to_string()), ("outcome", outcome.to_string())];
    metrics::counter!("bff_upstream_requests_total", &labels[..]).increment(1);
    metrics::histogram!("bff_upstream_duration_seconds", &labels[..]).record(start.elapsed().as_secs_f64());
}

pub fn record_sale_candidate(shape: &'static str, outcome: &'static str) {
    metrics::counter!("bff_sale_candidates_total", "shape" => shape, "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(reason: &'static str) {
    metrics::counter!("bff_rate_limited_total", "reason" => reason).increment(1);
}

pub fn record_logout(joined: bool) {
    let role = if joined { "joined" } else { "leader" };
    metrics::counter!("bff_logout_total", "role" => role).increment(1);
}

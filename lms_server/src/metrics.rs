//! Prometheus metrics for monitoring server health and game activity.
//!
//! Metrics are exposed in Prometheus text format on a separate listener
//! (`METRICS_BIND`). Recording is a no-op until [`init_metrics`] installs the
//! exporter, so handlers call these unconditionally.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use lms_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/games/{game_id}/advance", 200);
//! metrics::games_advanced_total("completed");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// `path` should be the route template, not the concrete URI, to keep label
/// cardinality bounded.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Increment games created counter.
pub fn games_created_total() {
    metrics::counter!("games_created_total").increment(1);
}

/// Increment advances counter, labelled by what the advance did.
pub fn games_advanced_total(outcome: &str) {
    metrics::counter!("games_advanced_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment rounds closed counter.
pub fn rounds_closed_total() {
    metrics::counter!("rounds_closed_total").increment(1);
}

/// Increment rounds reopened counter.
pub fn rounds_reopened_total() {
    metrics::counter!("rounds_reopened_total").increment(1);
}

/// Record how many participants one round close eliminated.
pub fn participants_eliminated(count: usize) {
    metrics::histogram!("participants_eliminated_per_round").record(count as f64);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

//! Prometheus metrics for request and authentication outcomes.
//!
//! Metrics are recorded through the `metrics` facade. Without an installed
//! exporter the calls are no-ops; [`init_metrics`] installs a Prometheus
//! scrape listener.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ag_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::signin_total(metrics::SigninOutcome::Success);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter listening on `addr`
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record a completed HTTP request and its duration
pub fn http_request(method: &str, path: &str, status: u16, duration_ms: f64) {
    ::metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Result of a signup attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Created,
    Taken,
    Invalid,
    Error,
}

impl SignupOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupOutcome::Created => "created",
            SignupOutcome::Taken => "taken",
            SignupOutcome::Invalid => "invalid",
            SignupOutcome::Error => "error",
        }
    }
}

/// Result of a signin attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigninOutcome {
    Success,
    InvalidCredentials,
    Invalid,
    Error,
}

impl SigninOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SigninOutcome::Success => "success",
            SigninOutcome::InvalidCredentials => "invalid_credentials",
            SigninOutcome::Invalid => "invalid",
            SigninOutcome::Error => "error",
        }
    }
}

/// Increment signup counter
pub fn signup_total(outcome: SignupOutcome) {
    ::metrics::counter!("auth_signup_total", "outcome" => outcome.as_str()).increment(1);
}

/// Increment signin counter
pub fn signin_total(outcome: SigninOutcome) {
    ::metrics::counter!("auth_signin_total", "outcome" => outcome.as_str()).increment(1);
}

/// Increment counter of requests turned away by the identity guard
pub fn guard_rejections_total() {
    ::metrics::counter!("auth_guard_rejections_total").increment(1);
}

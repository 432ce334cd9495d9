//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_admitted_total` (counter): admissions by profile
//! - `guard_requests_rejected_total` (counter): rejections by reason
//! - `guard_tracked_keys` (gauge): live keys per limiter profile
//! - `guard_sweep_evicted_total` (counter): sweep evictions by store
//!
//! # Design Decisions
//! - Low-overhead updates (atomic counters behind the metrics crate)
//! - Labels for profile and rejection reason only; client keys are never
//!   used as labels (unbounded cardinality)

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admitted(profile: &str) {
    counter!("guard_requests_admitted_total", "profile" => profile.to_string()).increment(1);
}

pub fn record_rejected(reason: &'static str) {
    counter!("guard_requests_rejected_total", "reason" => reason).increment(1);
}

pub fn record_tracked_keys(profile: &str, keys: usize) {
    gauge!("guard_tracked_keys", "profile" => profile.to_string()).set(keys as f64);
}

pub fn record_sweep(window_evictions: usize, token_evictions: usize) {
    counter!("guard_sweep_evicted_total", "store" => "rate_limit")
        .increment(window_evictions as u64);
    counter!("guard_sweep_evicted_total", "store" => "csrf").increment(token_evictions as u64);
}

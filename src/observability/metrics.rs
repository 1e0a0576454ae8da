//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define failover metrics (mode, connect attempts, failovers, health)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `failover_connection_mode` (gauge): 0=disconnected, 1=primary, 2=fallback
//! - `failover_connect_attempts_total` (counter): by mode, outcome
//! - `failover_transitions_total` (counter): by from, to, reason
//! - `failover_degraded_total` (counter): degraded signals by mode
//! - `failover_backend_reachable` (gauge): 1=reachable, 0=unreachable
//! - `failover_backend_uptime_seconds` (gauge)
//! - `failover_cpu_temperature_celsius` (gauge)
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::connection::{FailoverReason, OperatingMode};
use crate::health::HealthSample;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the active mode, or `None` when disconnected.
pub fn record_mode(mode: Option<OperatingMode>) {
    gauge!("failover_connection_mode").set(mode.map_or(0.0, OperatingMode::as_gauge));
}

pub fn record_connect_attempt(mode: OperatingMode, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "failover_connect_attempts_total",
        "mode" => mode.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_failover(from: OperatingMode, to: OperatingMode, reason: &FailoverReason) {
    let reason = match reason {
        FailoverReason::BackendUnreachable => "unreachable",
        FailoverReason::Overheated { .. } => "overheated",
    };
    counter!(
        "failover_transitions_total",
        "from" => from.as_str(),
        "to" => to.as_str(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_degraded(mode: OperatingMode) {
    counter!("failover_degraded_total", "mode" => mode.as_str()).increment(1);
}

pub fn record_health_sample(sample: &HealthSample) {
    gauge!("failover_backend_reachable").set(if sample.backend_reachable { 1.0 } else { 0.0 });
    if let Some(uptime) = sample.uptime_seconds {
        gauge!("failover_backend_uptime_seconds").set(uptime as f64);
    }
    if let Some(celsius) = sample.cpu_temperature_celsius {
        gauge!("failover_cpu_temperature_celsius").set(celsius);
    }
}

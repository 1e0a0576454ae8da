//! One monitoring cycle's observations.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::connection::{OperatingMode, ServerStatus};
use crate::observability::metrics;

/// Snapshot produced by one monitoring cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSample {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub mode: OperatingMode,
    /// Whether a handle existed when the cycle started.
    pub connected: bool,
    pub backend_reachable: bool,
    pub uptime_seconds: Option<u64>,
    pub host_identifier: Option<String>,
    pub cpu_temperature_celsius: Option<f64>,
}

impl HealthSample {
    pub fn new(mode: OperatingMode, connected: bool) -> Self {
        Self {
            timestamp: unix_now(),
            mode,
            connected,
            backend_reachable: false,
            uptime_seconds: None,
            host_identifier: None,
            cpu_temperature_celsius: None,
        }
    }

    pub fn record_status(&mut self, status: ServerStatus) {
        self.backend_reachable = true;
        self.uptime_seconds = Some(status.uptime_seconds);
        self.host_identifier = Some(status.host);
    }

    pub fn is_healthy(&self) -> bool {
        self.connected && self.backend_reachable
    }

    /// Publish the sample as a log record and metrics.
    pub fn emit(&self) {
        metrics::record_health_sample(self);

        if !self.connected {
            tracing::warn!(
                mode = %self.mode,
                cpu_temperature_celsius = ?self.cpu_temperature_celsius,
                "Health check: DEGRADED - no backend connection"
            );
        } else if self.backend_reachable {
            tracing::info!(
                mode = %self.mode,
                host = self.host_identifier.as_deref().unwrap_or("unknown"),
                uptime_seconds = self.uptime_seconds.unwrap_or(0),
                cpu_temperature_celsius = ?self.cpu_temperature_celsius,
                "Health check: OK"
            );
        } else {
            tracing::warn!(
                mode = %self.mode,
                cpu_temperature_celsius = ?self.cpu_temperature_celsius,
                "Health check: backend unreachable"
            );
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

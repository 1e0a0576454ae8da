//! Connection manager error types.

use thiserror::Error;

use crate::connection::driver::DriverError;
use crate::connection::OperatingMode;

/// Why a failover was requested.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailoverReason {
    /// The liveness check failed.
    BackendUnreachable,
    /// Host CPU temperature crossed the critical threshold.
    Overheated { celsius: f64 },
}

impl std::fmt::Display for FailoverReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailoverReason::BackendUnreachable => write!(f, "backend unreachable"),
            FailoverReason::Overheated { celsius } => write!(f, "cpu overheated ({:.1}°C)", celsius),
        }
    }
}

/// Errors surfaced by the connection manager.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// A single mode could not be connected. Recovered internally when a
    /// further fallback tier exists.
    #[error("failed to connect in {mode} mode: {source}")]
    Connect {
        mode: OperatingMode,
        #[source]
        source: DriverError,
    },

    /// Every tier of the fallback chain failed. Fatal at startup.
    #[error("backend unavailable: all modes failed after requesting {requested}")]
    BackendUnavailable {
        requested: OperatingMode,
        #[source]
        source: Box<ConnectionError>,
    },

    /// Already on the last tier and it is failing too.
    #[error("degraded in {mode} mode with no further fallback ({reason})")]
    DegradedNoFallback {
        mode: OperatingMode,
        reason: FailoverReason,
    },

    /// No live handle right now. Callers should retry later.
    #[error("backend connection temporarily unavailable")]
    NotConnected,
}

impl ConnectionError {
    /// Whether a consumer may retry the operation later.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ConnectionError::NotConnected | ConnectionError::DegradedNoFallback { .. }
        )
    }
}

//! Operating modes and the fallback transition table.
//!
//! # State Transitions
//! ```text
//! Uninitialized → Primary ⇄ Fallback
//!
//! On connect failure:
//!     Primary  → Fallback
//!     Fallback → (terminal)
//! ```
//!
//! Failover only ever moves `Primary → Fallback`. Promotion back to
//! `Primary` requires an explicit `connect(Primary)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend topology the manager is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Multi-node, consensus-replicated cluster.
    #[serde(alias = "replica")]
    Primary,
    /// Single-node backup.
    #[serde(alias = "standalone")]
    Fallback,
}

impl OperatingMode {
    /// Mode to retry in when connecting in `self` fails.
    ///
    /// `None` means there is no further tier: the failure is terminal.
    pub fn fallback(self) -> Option<OperatingMode> {
        match self {
            OperatingMode::Primary => Some(OperatingMode::Fallback),
            OperatingMode::Fallback => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperatingMode::Primary => "primary",
            OperatingMode::Fallback => "fallback",
        }
    }

    /// Numeric encoding used for the mode gauge.
    pub fn as_gauge(self) -> f64 {
        match self {
            OperatingMode::Primary => 1.0,
            OperatingMode::Fallback => 2.0,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mode '{0}': use \"primary\" or \"fallback\"")]
pub struct ParseModeError(String);

impl FromStr for OperatingMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "replica" => Ok(OperatingMode::Primary),
            "fallback" | "standalone" => Ok(OperatingMode::Fallback),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

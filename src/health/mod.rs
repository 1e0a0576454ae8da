//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Every interval (monitor.rs):
//!     ConnectionManager snapshot
//!     → liveness check (admin_ping + admin_status, bounded)
//!     → thermal reading (sensor.rs)
//!     → HealthSample (sample.rs) → logs + metrics
//!     → evaluate(): overheated → failover(), unreachable in Primary → failover()
//!     → stats.rs counters
//!
//! control.rs:
//!     start / stop / check_now / manual override
//! ```
//!
//! # Design Decisions
//! - Check errors are absorbed into the sample; nothing escapes a cycle
//! - Checks run without holding the manager's transition lock
//! - Unreachable in Fallback raises a degraded signal instead of a failover

pub mod control;
pub mod monitor;
pub mod sample;
pub mod sensor;
pub mod stats;

pub use control::MonitorControl;
pub use monitor::{
    evaluate, CheckError, CycleReport, HealthMonitor, MonitorSettings, SettingsUpdate,
};
pub use sample::HealthSample;
pub use sensor::{select_sensor, SysfsSensor, ThermalSensor, UnsupportedSensor, WmiSensor};
pub use stats::{MonitorStats, StatsSnapshot};

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the failover
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::connection::OperatingMode;

/// Root configuration for the failover service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FailoverConfig {
    /// Backend endpoints and connection settings.
    pub backend: BackendConfig,

    /// Health monitor settings.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Seed list of the replicated cluster used in `Primary` mode.
    pub primary_seeds: Vec<String>,

    /// Replica set name advertised by the cluster, if any.
    pub replica_set: Option<String>,

    /// Single-node address used in `Fallback` mode.
    pub fallback_address: String,

    /// Connection establishment timeout in seconds (open + liveness check).
    pub connect_timeout_secs: u64,

    /// Mode requested at startup.
    pub default_mode: OperatingMode,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            primary_seeds: vec![
                "127.0.0.1:28017".to_string(),
                "127.0.0.1:28018".to_string(),
                "127.0.0.1:28019".to_string(),
            ],
            replica_set: Some("rs0".to_string()),
            fallback_address: "127.0.0.1:28020".to_string(),
            connect_timeout_secs: 5,
            default_mode: OperatingMode::Primary,
        }
    }
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Start the monitor together with the service.
    pub enabled: bool,

    /// Monitoring period in seconds.
    pub interval_secs: u64,

    /// Upper bound for a single liveness check in seconds.
    pub check_timeout_secs: u64,

    /// CPU temperature above which the monitor forces a failover.
    pub critical_temperature_celsius: f64,

    /// Thermal sensor selection.
    pub sensor: SensorConfig,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            check_timeout_secs: 5,
            critical_temperature_celsius: 80.0,
            sensor: SensorConfig::default(),
        }
    }
}

/// Which thermal sensor implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Pick by target platform.
    Auto,
    /// Linux sysfs thermal zones.
    Sysfs,
    /// Windows WMI thermal zone query.
    Wmi,
    /// Never report a temperature.
    None,
}

/// Thermal sensor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorConfig {
    pub kind: SensorKind,

    /// Candidate sysfs files (millidegrees Celsius), first readable wins.
    pub sysfs_paths: Vec<String>,

    /// Upper bound for one sensor read in seconds.
    pub read_timeout_secs: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::Auto,
            sysfs_paths: vec![
                "/sys/class/thermal/thermal_zone0/temp".to_string(),
                "/sys/class/hwmon/hwmon0/temp1_input".to_string(),
                "/sys/class/hwmon/hwmon1/temp1_input".to_string(),
                "/sys/devices/virtual/thermal/thermal_zone0/temp".to_string(),
            ],
            read_timeout_secs: 2,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

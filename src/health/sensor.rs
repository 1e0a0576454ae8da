//! Host thermal sensors.
//!
//! # Implementations
//! - `SysfsSensor`: Linux thermal zone / hwmon files (millidegrees Celsius)
//! - `WmiSensor`: Windows `MSAcpi_ThermalZoneTemperature` (tenths of Kelvin)
//! - `UnsupportedSensor`: always `None`
//!
//! The sensor is chosen once at startup; the monitor never branches on the
//! platform. A sensor never fails: missing data is `None`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{SensorConfig, SensorKind};

/// Source of host CPU temperature readings.
#[async_trait]
pub trait ThermalSensor: Send + Sync + std::fmt::Debug {
    async fn read_cpu_temperature(&self) -> Option<f64>;

    fn name(&self) -> &'static str;
}

/// Select the sensor implementation for this host.
pub fn select_sensor(config: &SensorConfig) -> Arc<dyn ThermalSensor> {
    let timeout = Duration::from_secs(config.read_timeout_secs);
    let kind = match config.kind {
        SensorKind::Auto if cfg!(target_os = "linux") => SensorKind::Sysfs,
        SensorKind::Auto if cfg!(target_os = "windows") => SensorKind::Wmi,
        SensorKind::Auto => SensorKind::None,
        other => other,
    };

    let sensor: Arc<dyn ThermalSensor> = match kind {
        SensorKind::Sysfs => Arc::new(SysfsSensor::new(
            config.sysfs_paths.iter().map(PathBuf::from).collect(),
        )),
        SensorKind::Wmi => Arc::new(WmiSensor::new(timeout)),
        SensorKind::None | SensorKind::Auto => Arc::new(UnsupportedSensor),
    };

    tracing::info!(sensor = sensor.name(), "Thermal sensor selected");
    sensor
}

/// Reads the first readable sysfs temperature file.
#[derive(Debug, Clone)]
pub struct SysfsSensor {
    paths: Vec<PathBuf>,
}

impl SysfsSensor {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl ThermalSensor for SysfsSensor {
    async fn read_cpu_temperature(&self) -> Option<f64> {
        for path in &self.paths {
            match tokio::fs::read_to_string(path).await {
                Ok(raw) => match parse_millidegrees(&raw) {
                    Some(celsius) => return Some(celsius),
                    None => tracing::debug!(path = %path.display(), "Unparseable thermal reading"),
                },
                Err(e) => tracing::trace!(path = %path.display(), error = %e, "Thermal file unavailable"),
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "sysfs"
    }
}

/// Queries WMI through PowerShell.
#[derive(Debug, Clone)]
pub struct WmiSensor {
    timeout: Duration,
}

const WMI_QUERY: &str = "Get-CimInstance -Namespace root/wmi -ClassName MSAcpi_ThermalZoneTemperature \
                         | Select-Object -ExpandProperty CurrentTemperature";

impl WmiSensor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ThermalSensor for WmiSensor {
    async fn read_cpu_temperature(&self) -> Option<f64> {
        let output = tokio::process::Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", WMI_QUERY])
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) if output.status.success() => {
                parse_wmi_output(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(Ok(output)) => {
                tracing::debug!(status = %output.status, "WMI thermal query failed");
                None
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Failed to run WMI thermal query");
                None
            }
            Err(_) => {
                tracing::debug!(timeout = ?self.timeout, "WMI thermal query timed out");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "wmi"
    }
}

/// Placeholder for platforms without a sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSensor;

#[async_trait]
impl ThermalSensor for UnsupportedSensor {
    async fn read_cpu_temperature(&self) -> Option<f64> {
        None
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}

fn parse_millidegrees(raw: &str) -> Option<f64> {
    let milli: i64 = raw.trim().parse().ok()?;
    Some(milli as f64 / 1000.0)
}

/// First positive reading in tenths of Kelvin, converted to Celsius.
fn parse_wmi_output(raw: &str) -> Option<f64> {
    raw.lines()
        .filter_map(|line| line.trim().parse::<u64>().ok())
        .find(|&deci_kelvin| deci_kelvin > 0)
        .map(|deci_kelvin| deci_kelvin as f64 / 10.0 - 273.15)
}

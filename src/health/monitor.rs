//! Active health monitoring.
//!
//! # Responsibilities
//! - Periodically check the current backend handle and the host temperature
//! - Ask the connection manager to fail over on sustained trouble
//! - Never let a single bad cycle escape the loop

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tokio::time::{self, MissedTickBehavior};

use crate::config::validation::ValidationError;
use crate::config::HealthConfig;
use crate::connection::{
    ConnectionError, ConnectionHandle, ConnectionManager, DriverError, FailoverReason,
    OperatingMode, ServerStatus,
};
use crate::health::sample::HealthSample;
use crate::health::sensor::ThermalSensor;
use crate::health::stats::MonitorStats;
use crate::lifecycle::ShutdownSignal;
use crate::resilience::timeouts::with_timeout;

/// Check failure, contained within one cycle.
#[derive(Debug, thiserror::Error)]
#[error("liveness check failed: {0}")]
pub struct CheckError(#[from] DriverError);

/// What one cycle observed and did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub sample: HealthSample,
    /// Reason of a failover the manager acted on, including the degraded
    /// no-op in `Fallback`. `None` when the verdict was stale.
    pub failover: Option<FailoverReason>,
    /// Set when the cycle raised a degraded signal.
    pub degraded: bool,
}

/// Monitor tunables that may change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonitorSettings {
    pub interval_secs: u64,
    pub critical_temperature_celsius: f64,
}

/// Partial update of [`MonitorSettings`]; absent fields are kept.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettingsUpdate {
    pub interval_secs: Option<u64>,
    pub critical_temperature_celsius: Option<f64>,
}

/// Background supervisor of backend and host health.
pub struct HealthMonitor {
    manager: Arc<ConnectionManager>,
    sensor: Arc<dyn ThermalSensor>,
    check_timeout: Duration,
    settings: ArcSwap<MonitorSettings>,
    stats: Arc<MonitorStats>,
}

impl HealthMonitor {
    pub fn new(
        manager: Arc<ConnectionManager>,
        sensor: Arc<dyn ThermalSensor>,
        config: &HealthConfig,
    ) -> Self {
        Self {
            manager,
            sensor,
            check_timeout: Duration::from_secs(config.check_timeout_secs),
            settings: ArcSwap::from_pointee(MonitorSettings {
                interval_secs: config.interval_secs,
                critical_temperature_celsius: config.critical_temperature_celsius,
            }),
            stats: Arc::new(MonitorStats::new()),
        }
    }

    pub fn stats(&self) -> &Arc<MonitorStats> {
        &self.stats
    }

    pub fn settings(&self) -> MonitorSettings {
        **self.settings.load()
    }

    /// Apply a partial settings update after validating it.
    ///
    /// The threshold applies from the next cycle; a new interval only takes
    /// effect when the loop is restarted.
    pub fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<MonitorSettings, Vec<ValidationError>> {
        let mut errors = Vec::new();
        if update.interval_secs == Some(0) {
            errors.push(ValidationError::new("interval_secs", "must be > 0"));
        }
        if let Some(threshold) = update.critical_temperature_celsius {
            if !threshold.is_finite() || threshold <= 0.0 {
                errors.push(ValidationError::new(
                    "critical_temperature_celsius",
                    "must be a positive number of degrees",
                ));
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let current = self.settings();
        let updated = MonitorSettings {
            interval_secs: update.interval_secs.unwrap_or(current.interval_secs),
            critical_temperature_celsius: update
                .critical_temperature_celsius
                .unwrap_or(current.critical_temperature_celsius),
        };
        self.settings.store(Arc::new(updated));
        tracing::info!(
            interval_secs = updated.interval_secs,
            critical_temperature_celsius = updated.critical_temperature_celsius,
            "Monitor settings updated"
        );
        Ok(updated)
    }

    /// Run cycles until `shutdown` fires.
    ///
    /// An in-flight check is dropped on shutdown; a failover it already
    /// started runs to completion on its own task.
    pub async fn run(self: Arc<Self>, mut shutdown: ShutdownSignal) {
        let settings = self.settings();
        tracing::info!(
            interval_secs = settings.interval_secs,
            critical_temperature_celsius = settings.critical_temperature_celsius,
            sensor = self.sensor.name(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(settings.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
                _ = async {
                    ticker.tick().await;
                    self.check_once().await
                } => {}
            }
        }
    }

    /// Run one monitoring cycle.
    pub async fn check_once(&self) -> CycleReport {
        let state = self.manager.state();
        let mode = state.mode;
        let handle = state.handle.clone();
        drop(state);

        let Some(handle) = handle else {
            let sample = HealthSample::new(mode, false);
            sample.emit();
            self.stats.record_check(false);
            return CycleReport {
                sample,
                failover: None,
                degraded: false,
            };
        };

        let mut sample = HealthSample::new(mode, true);
        match self.check_backend(&handle).await {
            Ok(status) => sample.record_status(status),
            Err(e) => tracing::warn!(mode = %mode, error = %e, "Health check failed"),
        }

        sample.cpu_temperature_celsius = self.sensor.read_cpu_temperature().await;

        let threshold = self.settings.load().critical_temperature_celsius;
        let action = evaluate(&sample, threshold);
        sample.emit();
        self.stats.record_check(sample.is_healthy() && action.is_none());

        let mut report = CycleReport {
            sample,
            failover: None,
            degraded: false,
        };

        match action {
            Some(reason) if self.stats.manual_override() => {
                tracing::warn!(reason = %reason, "Manual override active, not failing over");
            }
            Some(reason) => {
                if let FailoverReason::Overheated { celsius } = reason {
                    tracing::error!(
                        severity = "critical",
                        cpu_temperature_celsius = celsius,
                        "Overheating detected, initiating failover"
                    );
                }

                // The transition runs on its own task: stopping the monitor
                // must not abandon it between disconnect and reconnect.
                let manager = self.manager.clone();
                let transition = tokio::spawn(async move {
                    manager.failover_observed(&handle, reason).await
                });
                let outcome = match transition.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(error = %e, "Failover task ended abnormally");
                        return report;
                    }
                };

                match outcome {
                    Ok(Some(_)) => {
                        self.stats.record_failover();
                        report.failover = Some(reason);
                    }
                    Ok(None) => {}
                    Err(ConnectionError::DegradedNoFallback { .. }) => {
                        report.failover = Some(reason);
                        report.degraded = true;
                    }
                    Err(e) => {
                        self.stats.record_failover();
                        report.failover = Some(reason);
                        tracing::error!(error = %e, "Failover attempt failed");
                    }
                }
            }
            None if !report.sample.backend_reachable => {
                // Unreachable on the last tier: nowhere to go, only report.
                self.manager.signal_degraded(FailoverReason::BackendUnreachable);
                report.degraded = true;
            }
            None => {}
        }

        report
    }

    async fn check_backend(&self, handle: &ConnectionHandle) -> Result<ServerStatus, CheckError> {
        let status = with_timeout(self.check_timeout, async {
            handle.admin_ping().await?;
            handle.admin_status().await
        })
        .await?;
        Ok(status)
    }
}

/// Decide whether a sample calls for a failover.
///
/// Overheating wins over reachability; an unreachable backend only
/// triggers a failover from `Primary`.
pub fn evaluate(sample: &HealthSample, critical_temperature: f64) -> Option<FailoverReason> {
    if let Some(celsius) = sample.cpu_temperature_celsius {
        if celsius > critical_temperature {
            return Some(FailoverReason::Overheated { celsius });
        }
    }
    if !sample.backend_reachable && sample.mode == OperatingMode::Primary {
        return Some(FailoverReason::BackendUnreachable);
    }
    None
}

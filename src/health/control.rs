//! Start/stop control for the monitor task.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::validation::ValidationError;
use crate::health::monitor::{CycleReport, HealthMonitor, MonitorSettings, SettingsUpdate};
use crate::health::stats::StatsSnapshot;
use crate::lifecycle::Shutdown;

struct RunningMonitor {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

/// Owns the monitor task and lets callers start, stop and poke it.
pub struct MonitorControl {
    monitor: Arc<HealthMonitor>,
    running: Mutex<Option<RunningMonitor>>,
}

impl MonitorControl {
    pub fn new(monitor: HealthMonitor) -> Self {
        Self {
            monitor: Arc::new(monitor),
            running: Mutex::new(None),
        }
    }

    /// Spawn the monitor loop. Returns `false` if it is already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            return false;
        }

        let shutdown = Shutdown::new();
        let task = tokio::spawn(self.monitor.clone().run(shutdown.subscribe()));
        *running = Some(RunningMonitor { shutdown, task });
        tracing::info!("Health monitoring started");
        true
    }

    /// Signal the loop to exit and wait for it. Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(RunningMonitor { shutdown, task }) = self.running.lock().await.take() else {
            return false;
        };

        shutdown.trigger();
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Health monitor task ended abnormally");
        }
        tracing::info!("Health monitoring stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// Run one cycle immediately, outside the schedule.
    pub async fn check_now(&self) -> CycleReport {
        self.monitor.check_once().await
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.monitor.stats().snapshot()
    }

    pub fn settings(&self) -> MonitorSettings {
        self.monitor.settings()
    }

    /// Update the interval and threshold. A running loop is restarted when
    /// the interval changes.
    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<MonitorSettings, Vec<ValidationError>> {
        let previous = self.monitor.settings();
        let updated = self.monitor.update_settings(update)?;

        if updated.interval_secs != previous.interval_secs && self.is_running().await {
            tracing::info!(interval_secs = updated.interval_secs, "Restarting monitor with new interval");
            self.stop().await;
            self.start().await;
        }
        Ok(updated)
    }

    /// While enabled, cycles report problems but never call `failover()`.
    pub fn set_manual_override(&self, enabled: bool) {
        self.monitor.stats().set_manual_override(enabled);
        tracing::info!(enabled, "Manual override updated");
    }
}

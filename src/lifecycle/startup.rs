//! Startup and shutdown orchestration.
//!
//! # Responsibilities
//! - Build the connection manager and connect in the requested mode
//! - Start background tasks (health monitor, admin API)
//! - Tear everything down in reverse order
//!
//! # Design Decisions
//! - Fail fast: `BackendUnavailable` at startup is fatal
//! - Subsystems initialize in order, not concurrently
//! - The admin API starts last (operators only see a connected service)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::admin::{AdminServer, AdminState};
use crate::config::FailoverConfig;
use crate::connection::{BackendDriver, ConnectionError, ConnectionManager, HttpDriver, OperatingMode};
use crate::health::{select_sensor, HealthMonitor, MonitorControl, ThermalSensor};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid backend endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("failed to bind admin API on {address}: {source}")]
    AdminBind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A running failover service.
pub struct Service {
    manager: Arc<ConnectionManager>,
    monitor: Arc<MonitorControl>,
    admin: Option<AdminServer>,
}

impl Service {
    /// Start with the HTTP driver and the platform's thermal sensor.
    pub async fn start(config: &FailoverConfig, mode: OperatingMode) -> Result<Self, StartupError> {
        let driver: Arc<dyn BackendDriver> = Arc::new(HttpDriver::new());
        let sensor = select_sensor(&config.health.sensor);
        Self::start_with(config, mode, driver, sensor).await
    }

    /// Start with explicit collaborators.
    pub async fn start_with(
        config: &FailoverConfig,
        mode: OperatingMode,
        driver: Arc<dyn BackendDriver>,
        sensor: Arc<dyn ThermalSensor>,
    ) -> Result<Self, StartupError> {
        // 1. Connection (fatal on BackendUnavailable)
        let manager = Arc::new(ConnectionManager::from_config(driver, &config.backend)?);
        let connected = manager.connect(mode).await?;
        if connected != mode {
            tracing::warn!(requested = %mode, connected = %connected, "Started in degraded mode");
        }

        // 2. Health monitor
        let monitor = Arc::new(MonitorControl::new(HealthMonitor::new(
            manager.clone(),
            sensor,
            &config.health,
        )));
        if config.health.enabled {
            monitor.start().await;
        } else {
            tracing::info!("Health monitoring disabled");
        }

        // 3. Admin API
        let admin = if config.admin.enabled {
            let state = AdminState::new(manager.clone(), monitor.clone(), &config.admin.api_key);
            match AdminServer::bind(&config.admin.bind_address, state).await {
                Ok(server) => Some(server),
                Err(source) => {
                    monitor.stop().await;
                    manager.disconnect().await;
                    return Err(StartupError::AdminBind {
                        address: config.admin.bind_address.clone(),
                        source,
                    });
                }
            }
        } else {
            None
        };

        Ok(Self {
            manager,
            monitor,
            admin,
        })
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn monitor(&self) -> &Arc<MonitorControl> {
        &self.monitor
    }

    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin.as_ref().map(AdminServer::local_addr)
    }

    /// Stop the admin API and the monitor, then release the backend handle.
    pub async fn shutdown(self) {
        if let Some(admin) = self.admin {
            admin.stop().await;
        }
        self.monitor.stop().await;
        self.manager.disconnect().await;
        tracing::info!("Service stopped");
    }
}

//! Connection manager: the single owner of the operating mode and handle.
//!
//! # Responsibilities
//! - Open and verify handles, walking the fallback transition table
//! - Publish `(mode, handle)` snapshots atomically to readers
//! - Serialize connect / disconnect / failover
//! - Emit connection events and degraded signals
//!
//! # Design Decisions
//! - Readers load an `ArcSwap` snapshot and never block on a transition
//! - Writers hold one async mutex for the whole transition; checks run
//!   outside of the publication step
//! - A replaced handle is unpublished before it is closed, so a reader can
//!   never obtain a closed handle
//! - A failover decided on a checked handle is dropped if that handle is no
//!   longer the published one

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::config::BackendConfig;
use crate::connection::driver::{BackendDriver, ConnectionHandle, DriverError, ServerStatus};
use crate::connection::endpoint::EndpointSet;
use crate::connection::error::{ConnectionError, FailoverReason};
use crate::connection::OperatingMode;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

const EVENT_CAPACITY: usize = 64;

/// Snapshot of the manager's state.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    pub mode: OperatingMode,
    pub handle: Option<ConnectionHandle>,
}

/// State changes observable by other subsystems.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected { mode: OperatingMode },
    Disconnected { mode: OperatingMode },
    FailedOver { from: OperatingMode, to: OperatingMode, reason: FailoverReason },
    /// Failing on the last tier; no automatic recovery follows.
    Degraded { mode: OperatingMode, reason: FailoverReason },
}

/// Read-only status summary.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub mode: OperatingMode,
    pub connected: bool,
    pub members: Option<String>,
    pub failovers: u64,
}

/// Result of an on-demand liveness check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub mode: OperatingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Owns the live backend handle and the operating mode.
pub struct ConnectionManager {
    driver: Arc<dyn BackendDriver>,
    endpoints: EndpointSet,
    connect_timeout: Duration,
    state: ArcSwap<ConnectionState>,
    /// Serializes every state transition.
    transition: Mutex<()>,
    events: broadcast::Sender<ConnectionEvent>,
    failovers: AtomicU64,
}

impl ConnectionManager {
    /// Create a disconnected manager.
    ///
    /// The initial mode is `Primary`; nothing is opened until `connect`.
    pub fn new(
        driver: Arc<dyn BackendDriver>,
        endpoints: EndpointSet,
        connect_timeout: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            driver,
            endpoints,
            connect_timeout,
            state: ArcSwap::from_pointee(ConnectionState {
                mode: OperatingMode::Primary,
                handle: None,
            }),
            transition: Mutex::new(()),
            events,
            failovers: AtomicU64::new(0),
        }
    }

    /// Create a manager from backend configuration.
    pub fn from_config(
        driver: Arc<dyn BackendDriver>,
        config: &BackendConfig,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(
            driver,
            EndpointSet::from_config(config)?,
            Duration::from_secs(config.connect_timeout_secs),
        ))
    }

    /// Connect in `requested` mode, falling back along the transition table.
    ///
    /// Returns the mode actually connected. A failure on the last tier
    /// yields `BackendUnavailable` and leaves the published state as it was.
    /// Any previously installed handle is replaced only after the new one
    /// has passed its liveness check.
    pub async fn connect(&self, requested: OperatingMode) -> Result<OperatingMode, ConnectionError> {
        let _guard = self.transition.lock().await;
        self.connect_locked(requested).await
    }

    /// Release the current handle. Safe to call when already disconnected.
    pub async fn disconnect(&self) {
        let _guard = self.transition.lock().await;
        self.disconnect_locked().await;
    }

    /// Abandon `Primary` for `Fallback`.
    ///
    /// In `Fallback` there is nowhere further to go: the mode is left alone,
    /// a degraded signal is emitted and `DegradedNoFallback` is returned.
    pub async fn failover(&self, reason: FailoverReason) -> Result<OperatingMode, ConnectionError> {
        let _guard = self.transition.lock().await;
        self.failover_locked(reason).await
    }

    /// Fail over only if `observed` is still the published handle.
    ///
    /// Returns `Ok(None)` when another transition replaced or released the
    /// handle since it was observed; the verdict is then stale and nothing
    /// changes.
    pub async fn failover_observed(
        &self,
        observed: &ConnectionHandle,
        reason: FailoverReason,
    ) -> Result<Option<OperatingMode>, ConnectionError> {
        let _guard = self.transition.lock().await;
        let still_current = self
            .state
            .load()
            .handle
            .as_ref()
            .is_some_and(|handle| Arc::ptr_eq(handle, observed));
        if !still_current {
            tracing::info!(
                mode = %self.mode(),
                reason = %reason,
                "Connection changed since it was checked, skipping failover"
            );
            return Ok(None);
        }

        self.failover_locked(reason).await.map(Some)
    }

    async fn failover_locked(&self, reason: FailoverReason) -> Result<OperatingMode, ConnectionError> {
        let from = self.mode();

        let Some(target) = from.fallback() else {
            self.signal_degraded(reason);
            return Err(ConnectionError::DegradedNoFallback { mode: from, reason });
        };

        tracing::warn!(from = %from, to = %target, reason = %reason, "Initiating failover");
        self.failovers.fetch_add(1, Ordering::Relaxed);
        metrics::record_failover(from, target, &reason);

        self.disconnect_locked().await;
        match self.connect_locked(target).await {
            Ok(mode) => {
                tracing::info!(mode = %mode, "Failover complete");
                let _ = self.events.send(ConnectionEvent::FailedOver { from, to: mode, reason });
                Ok(mode)
            }
            Err(e) => {
                tracing::error!(severity = "critical", error = %e, "Failover failed; no backend connection");
                Err(e)
            }
        }
    }

    /// Emit the degraded signal without touching the state.
    pub fn signal_degraded(&self, reason: FailoverReason) {
        let mode = self.mode();
        tracing::error!(
            severity = "critical",
            mode = %mode,
            reason = %reason,
            "Backend degraded with no further fallback"
        );
        metrics::record_degraded(mode);
        let _ = self.events.send(ConnectionEvent::Degraded { mode, reason });
    }

    /// Current handle, or `None` when disconnected.
    pub fn get_handle(&self) -> Option<ConnectionHandle> {
        self.state.load().handle.clone()
    }

    /// Current handle, or the retriable `NotConnected` error.
    pub fn require_handle(&self) -> Result<ConnectionHandle, ConnectionError> {
        self.get_handle().ok_or(ConnectionError::NotConnected)
    }

    pub fn mode(&self) -> OperatingMode {
        self.state.load().mode
    }

    /// Consistent `(mode, handle)` snapshot.
    pub fn state(&self) -> Arc<ConnectionState> {
        self.state.load_full()
    }

    pub fn is_connected(&self) -> bool {
        self.state.load().handle.is_some()
    }

    /// Number of failovers attempted since start.
    pub fn failover_count(&self) -> u64 {
        self.failovers.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> ConnectionStatus {
        let state = self.state.load();
        ConnectionStatus {
            mode: state.mode,
            connected: state.handle.is_some(),
            members: state.handle.as_ref().map(|h| h.endpoint().describe()),
            failovers: self.failover_count(),
        }
    }

    /// Check the current handle without changing any state.
    pub async fn check_health(&self) -> HealthReport {
        let state = self.state();
        let Some(handle) = state.handle.clone() else {
            return HealthReport {
                healthy: false,
                mode: state.mode,
                status: None,
                error: Some(ConnectionError::NotConnected.to_string()),
            };
        };

        let check = with_timeout(self.connect_timeout, async {
            handle.admin_ping().await?;
            handle.admin_status().await
        })
        .await;

        match check {
            Ok(status) => HealthReport {
                healthy: true,
                mode: state.mode,
                status: Some(status),
                error: None,
            },
            Err(e) => HealthReport {
                healthy: false,
                mode: state.mode,
                status: None,
                error: Some(e.to_string()),
            },
        }
    }

    async fn connect_locked(&self, requested: OperatingMode) -> Result<OperatingMode, ConnectionError> {
        let mut mode = requested;
        loop {
            tracing::info!(mode = %mode, members = %self.endpoints.for_mode(mode).describe(), "Connecting to backend");

            match self.open_verified(mode).await {
                Ok(handle) => {
                    metrics::record_connect_attempt(mode, true);
                    self.install(mode, handle).await;
                    tracing::info!(mode = %mode, "Connected to backend");
                    return Ok(mode);
                }
                Err(source) => {
                    metrics::record_connect_attempt(mode, false);
                    let error = ConnectionError::Connect { mode, source };
                    tracing::error!(error = %error, "Backend connection failed");

                    match mode.fallback() {
                        Some(next) => {
                            tracing::warn!(from = %mode, to = %next, "Switching to fallback mode");
                            mode = next;
                        }
                        None => {
                            tracing::error!(severity = "critical", "All backend connection modes failed");
                            return Err(ConnectionError::BackendUnavailable {
                                requested,
                                source: Box::new(error),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Open a handle for `mode` and run the liveness check, within the connect timeout.
    async fn open_verified(&self, mode: OperatingMode) -> Result<ConnectionHandle, DriverError> {
        let endpoint = self.endpoints.for_mode(mode);
        let handle = with_timeout(
            self.connect_timeout,
            self.driver.open(endpoint, self.connect_timeout),
        )
        .await?;

        match with_timeout(self.connect_timeout, handle.admin_ping()).await {
            Ok(()) => Ok(handle),
            Err(e) => {
                handle.close().await;
                Err(e)
            }
        }
    }

    async fn install(&self, mode: OperatingMode, handle: ConnectionHandle) {
        let previous = self.state.swap(Arc::new(ConnectionState {
            mode,
            handle: Some(handle),
        }));
        if let Some(old) = &previous.handle {
            old.close().await;
        }
        metrics::record_mode(Some(mode));
        let _ = self.events.send(ConnectionEvent::Connected { mode });
    }

    async fn disconnect_locked(&self) {
        let mode = self.mode();
        let previous = self.state.swap(Arc::new(ConnectionState { mode, handle: None }));
        if let Some(handle) = &previous.handle {
            handle.close().await;
            tracing::info!(mode = %mode, "Backend disconnected");
            metrics::record_mode(None);
            let _ = self.events.send(ConnectionEvent::Disconnected { mode });
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.load();
        f.debug_struct("ConnectionManager")
            .field("mode", &state.mode)
            .field("connected", &state.handle.is_some())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

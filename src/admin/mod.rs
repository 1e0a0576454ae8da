//! Operator-facing admin API.
//!
//! Exposes the connection status, the explicit `connect(mode)` re-entry
//! point and the monitor controls over HTTP, guarded by a bearer API key.

pub mod auth;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::connection::ConnectionManager;
use crate::health::MonitorControl;
use crate::lifecycle::Shutdown;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub manager: Arc<ConnectionManager>,
    pub monitor: Arc<MonitorControl>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(manager: Arc<ConnectionManager>, monitor: Arc<MonitorControl>, api_key: &str) -> Self {
        Self {
            manager,
            monitor,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/health", get(get_health))
        .route("/admin/switch", post(switch_mode))
        .route("/admin/monitor/start", post(start_monitor))
        .route("/admin/monitor/stop", post(stop_monitor))
        .route("/admin/monitor/stats", get(get_monitor_stats))
        .route("/admin/monitor/check", post(run_check))
        .route("/admin/monitor/override", post(set_override))
        .route("/admin/monitor/config", put(update_monitor_config))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admin API bound to a listener and served in the background.
pub struct AdminServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl AdminServer {
    pub async fn bind(address: &str, state: AdminState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;

        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        let app = admin_router(state);

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.recv().await })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API server failed");
            }
        });

        tracing::info!(address = %local_addr, "Admin API listening");
        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Admin API task ended abnormally");
        }
        tracing::info!("Admin API stopped");
    }
}

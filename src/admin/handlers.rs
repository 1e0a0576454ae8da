use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::connection::{ConnectionStatus, HealthReport, OperatingMode};
use crate::health::{CycleReport, MonitorSettings, SettingsUpdate, StatsSnapshot};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub connection: ConnectionStatus,
    pub monitoring: bool,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionStatus>,
}

impl ActionResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            connection: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            connection: None,
        }
    }
}

#[derive(Deserialize)]
pub struct SwitchRequest {
    pub mode: String,
}

#[derive(Deserialize)]
pub struct OverrideRequest {
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct MonitorStatsResponse {
    pub monitoring: bool,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

#[derive(Serialize)]
pub struct SettingsResponse {
    pub success: bool,
    pub message: String,
    pub settings: MonitorSettings,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        connection: state.manager.status(),
        monitoring: state.monitor.is_running().await,
    })
}

pub async fn get_health(State(state): State<AdminState>) -> Json<HealthReport> {
    Json(state.manager.check_health().await)
}

/// Explicit `connect(mode)`; the only way back to Primary after a failover.
pub async fn switch_mode(
    State(state): State<AdminState>,
    Json(request): Json<SwitchRequest>,
) -> (StatusCode, Json<ActionResponse>) {
    let mode: OperatingMode = match request.mode.parse() {
        Ok(mode) => mode,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ActionResponse::failed(e.to_string())),
            )
        }
    };

    tracing::info!(mode = %mode, "Operator requested mode switch");
    match state.manager.connect(mode).await {
        Ok(connected) => {
            let mut response = ActionResponse::ok(format!("Connected in {} mode", connected));
            response.connection = Some(state.manager.status());
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            let mut response = ActionResponse::failed(format!("Failed to switch to {}: {}", mode, e));
            response.connection = Some(state.manager.status());
            (StatusCode::SERVICE_UNAVAILABLE, Json(response))
        }
    }
}

pub async fn start_monitor(State(state): State<AdminState>) -> Json<ActionResponse> {
    if state.monitor.start().await {
        Json(ActionResponse::ok("Health monitoring started"))
    } else {
        Json(ActionResponse::failed("Monitoring already active"))
    }
}

pub async fn stop_monitor(State(state): State<AdminState>) -> Json<ActionResponse> {
    if state.monitor.stop().await {
        Json(ActionResponse::ok("Health monitoring stopped"))
    } else {
        Json(ActionResponse::failed("Monitoring not active"))
    }
}

pub async fn get_monitor_stats(State(state): State<AdminState>) -> Json<MonitorStatsResponse> {
    Json(MonitorStatsResponse {
        monitoring: state.monitor.is_running().await,
        stats: state.monitor.stats(),
    })
}

pub async fn run_check(State(state): State<AdminState>) -> Json<CycleReport> {
    Json(state.monitor.check_now().await)
}

pub async fn set_override(
    State(state): State<AdminState>,
    Json(request): Json<OverrideRequest>,
) -> Json<ActionResponse> {
    state.monitor.set_manual_override(request.enabled);
    let status = if request.enabled { "enabled" } else { "disabled" };
    Json(ActionResponse::ok(format!("Manual override {}", status)))
}

/// Runtime update of the monitor interval and thermal threshold.
pub async fn update_monitor_config(
    State(state): State<AdminState>,
    Json(update): Json<SettingsUpdate>,
) -> (StatusCode, Json<SettingsResponse>) {
    match state.monitor.update_settings(update).await {
        Ok(settings) => (
            StatusCode::OK,
            Json(SettingsResponse {
                success: true,
                message: "Configuration updated".to_string(),
                settings,
            }),
        ),
        Err(errors) => {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            (
                StatusCode::BAD_REQUEST,
                Json(SettingsResponse {
                    success: false,
                    message,
                    settings: state.monitor.settings(),
                }),
            )
        }
    }
}

//! Backend driver over the backend's HTTP administrative API.
//!
//! # Responsibilities
//! - Bind a handle to an endpoint's member list
//! - Select a responding member for each check (last good member first)
//! - Decode administrative status responses
//!
//! # Protocol
//! ```text
//! GET {member}/admin/ping    → 2xx
//! GET {member}/admin/status  → {"uptime": <number>, "host": "<string>"}
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::connection::driver::{
    BackendDriver, BackendHandle, ConnectionHandle, DriverError, ServerStatus,
};
use crate::connection::endpoint::EndpointDescriptor;

const PING_PATH: &str = "admin/ping";
const STATUS_PATH: &str = "admin/status";

/// Driver that opens [`HttpHandle`]s.
#[derive(Debug, Clone, Default)]
pub struct HttpDriver;

impl HttpDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BackendDriver for HttpDriver {
    async fn open(
        &self,
        endpoint: &EndpointDescriptor,
        connect_timeout: Duration,
    ) -> Result<ConnectionHandle, DriverError> {
        if endpoint.members.is_empty() {
            return Err(DriverError::Unreachable(format!(
                "no members configured for {} endpoint",
                endpoint.mode
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(connect_timeout)
            .user_agent("backend-failover-monitor")
            .no_proxy()
            .build()
            .map_err(|e| DriverError::Protocol(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            mode = %endpoint.mode,
            members = %endpoint.describe(),
            "Opened backend handle"
        );

        Ok(Arc::new(HttpHandle {
            client,
            endpoint: endpoint.clone(),
            current: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    uptime: f64,
    host: String,
}

/// Handle bound to one endpoint's member list.
#[derive(Debug)]
pub struct HttpHandle {
    client: reqwest::Client,
    endpoint: EndpointDescriptor,
    /// Index of the member that answered last.
    current: AtomicUsize,
    closed: AtomicBool,
}

impl HttpHandle {
    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed.load(Ordering::Acquire) {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    /// Member indices in check order: last good member, then the rest.
    fn member_order(&self) -> impl Iterator<Item = usize> {
        let len = self.endpoint.members.len();
        let start = self.current.load(Ordering::Relaxed) % len;
        (0..len).map(move |offset| (start + offset) % len)
    }

    fn member_url(&self, idx: usize, path: &str) -> Result<Url, DriverError> {
        self.endpoint.members[idx]
            .join(path)
            .map_err(|e| DriverError::Protocol(format!("invalid admin URL: {}", e)))
    }

    fn current_member(&self) -> usize {
        self.current.load(Ordering::Relaxed) % self.endpoint.members.len()
    }
}

#[async_trait]
impl BackendHandle for HttpHandle {
    async fn admin_ping(&self) -> Result<(), DriverError> {
        self.ensure_open()?;

        let mut last_error = String::from("no members tried");
        for idx in self.member_order() {
            let url = self.member_url(idx, PING_PATH)?;
            match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    let previous = self.current.swap(idx, Ordering::Relaxed);
                    if previous != idx {
                        tracing::info!(member = %url, "Selected new backend member");
                    }
                    return Ok(());
                }
                Ok(response) => {
                    tracing::warn!(member = %url, status = %response.status(), "Ping rejected, trying next member");
                    last_error = format!("{} answered {}", url, response.status());
                }
                Err(e) => {
                    tracing::warn!(member = %url, error = %e, "Ping failed, trying next member");
                    last_error = format!("{}: {}", url, e);
                }
            }
        }

        Err(DriverError::Unreachable(last_error))
    }

    async fn admin_status(&self) -> Result<ServerStatus, DriverError> {
        self.ensure_open()?;

        let url = self.member_url(self.current_member(), STATUS_PATH)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DriverError::Unreachable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(DriverError::Protocol(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }

        let body: StatusBody = response
            .json()
            .await
            .map_err(|e| DriverError::Protocol(format!("invalid status body: {}", e)))?;

        if !body.uptime.is_finite() || body.uptime < 0.0 {
            return Err(DriverError::Protocol(format!("invalid uptime {}", body.uptime)));
        }

        Ok(ServerStatus {
            uptime_seconds: body.uptime as u64,
            host: body.host,
        })
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(members = %self.endpoint.describe(), "Closed backend handle");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }
}

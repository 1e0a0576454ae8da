//! Backend driver port.
//!
//! The manager only talks to the backend through these traits; the
//! concrete transport lives in `http_driver.rs` and tests supply scripted
//! implementations.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::endpoint::EndpointDescriptor;

/// Shared handle to an open backend connection.
pub type ConnectionHandle = Arc<dyn BackendHandle>;

/// Errors reported by a backend driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No member of the endpoint answered.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The operation did not finish within its deadline.
    #[error("backend operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with something we could not use.
    #[error("backend protocol error: {0}")]
    Protocol(String),

    /// The handle was closed.
    #[error("connection handle is closed")]
    Closed,
}

/// Result of an administrative status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub uptime_seconds: u64,
    pub host: String,
}

/// Opens handles to a backend endpoint.
#[async_trait]
pub trait BackendDriver: Send + Sync {
    async fn open(
        &self,
        endpoint: &EndpointDescriptor,
        connect_timeout: Duration,
    ) -> Result<ConnectionHandle, DriverError>;
}

/// An open connection bound to one endpoint.
#[async_trait]
pub trait BackendHandle: Send + Sync + Debug {
    /// Lightweight liveness request.
    async fn admin_ping(&self) -> Result<(), DriverError>;

    /// Server uptime and host identifier.
    async fn admin_status(&self) -> Result<ServerStatus, DriverError>;

    /// Release the connection. Idempotent.
    async fn close(&self);

    fn is_closed(&self) -> bool;

    fn endpoint(&self) -> &EndpointDescriptor;
}

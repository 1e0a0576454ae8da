//! Backend connection subsystem.
//!
//! # Data Flow
//! ```text
//! connect(mode):
//!     endpoint.rs (descriptor for mode)
//!     → driver.rs open + admin_ping (bounded by connect timeout)
//!     → success: manager.rs publishes (mode, handle)
//!     → failure: mode.rs transition table picks the next tier, if any
//!
//! Readers (CRUD layer, HealthMonitor, admin API):
//!     get_handle() → lock-free snapshot load
//! ```
//!
//! # Design Decisions
//! - One explicitly constructed `ConnectionManager`, shared via `Arc`
//! - Transport hidden behind the `BackendDriver` / `BackendHandle` traits
//! - Failover never promotes; returning to Primary is an explicit connect

pub mod driver;
pub mod endpoint;
pub mod error;
pub mod http_driver;
pub mod manager;
pub mod mode;

pub use driver::{BackendDriver, BackendHandle, ConnectionHandle, DriverError, ServerStatus};
pub use endpoint::{EndpointDescriptor, EndpointSet};
pub use error::{ConnectionError, FailoverReason};
pub use http_driver::HttpDriver;
pub use manager::{ConnectionEvent, ConnectionManager, ConnectionState, ConnectionStatus, HealthReport};
pub use mode::OperatingMode;

//! Backend connection resilience library.
//!
//! Keeps a live handle to a clustered storage backend, degrades from the
//! replicated `Primary` mode to a single-node `Fallback` on failure, and
//! supervises backend and host health in the background.

pub mod admin;
pub mod config;
pub mod connection;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::FailoverConfig;
pub use connection::{ConnectionManager, OperatingMode};
pub use health::{HealthMonitor, MonitorControl};
pub use lifecycle::{Service, Shutdown};

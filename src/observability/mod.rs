//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ConnectionManager and HealthMonitor produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Degraded signals are logged at error level with `severity = "critical"`
//!   and counted, so alerting can key off either

pub mod logging;
pub mod metrics;

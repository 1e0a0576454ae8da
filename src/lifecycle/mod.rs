//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → connect(mode) → start HealthMonitor → start admin API
//!
//! Shutdown (startup.rs + shutdown.rs):
//!     Signal received → stop admin API → stop monitor → disconnect → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: connection first, background tasks after
//! - Ordered shutdown: reverse of startup, handle released last

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Service, StartupError};

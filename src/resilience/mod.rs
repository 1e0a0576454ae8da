//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to backend (open, ping, status):
//!     → timeouts.rs (enforce connect/check deadline)
//!     → On failure: connection::mode transition table picks the next tier
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No blind retries: the only retry is the single Primary → Fallback step

pub mod timeouts;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FailoverConfig (validated, immutable)
//!     → consumed once when the ConnectionManager and HealthMonitor are built
//! ```
//!
//! # Design Decisions
//! - Config is static input; changing endpoints requires a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, BackendConfig, FailoverConfig, HealthConfig, LogFormat, ObservabilityConfig,
    SensorConfig, SensorKind,
};

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint addresses and value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FailoverConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FailoverConfig;
use crate::connection::endpoint::parse_address;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &FailoverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let backend = &config.backend;
    if backend.primary_seeds.is_empty() {
        errors.push(ValidationError::new(
            "backend.primary_seeds",
            "at least one seed address is required",
        ));
    }
    for seed in &backend.primary_seeds {
        if let Err(e) = parse_address(seed) {
            errors.push(ValidationError::new(
                "backend.primary_seeds",
                format!("invalid address '{}': {}", seed, e),
            ));
        }
    }
    if let Err(e) = parse_address(&backend.fallback_address) {
        errors.push(ValidationError::new(
            "backend.fallback_address",
            format!("invalid address '{}': {}", backend.fallback_address, e),
        ));
    }
    if backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("backend.connect_timeout_secs", "must be > 0"));
    }

    let health = &config.health;
    if health.interval_secs == 0 {
        errors.push(ValidationError::new("health.interval_secs", "must be > 0"));
    }
    if health.check_timeout_secs == 0 {
        errors.push(ValidationError::new("health.check_timeout_secs", "must be > 0"));
    }
    let threshold = health.critical_temperature_celsius;
    if !threshold.is_finite() || threshold <= 0.0 {
        errors.push(ValidationError::new(
            "health.critical_temperature_celsius",
            "must be a positive number of degrees",
        ));
    }
    if health.sensor.read_timeout_secs == 0 {
        errors.push(ValidationError::new("health.sensor.read_timeout_secs", "must be > 0"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    let admin = &config.admin;
    if admin.enabled {
        if admin.api_key.trim().is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        }
        if admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("'{}' is not a socket address", admin.bind_address),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Map elapsed deadlines to a distinct driver error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Every backend call made by this crate goes through here

use std::future::Future;
use std::time::Duration;

use crate::connection::DriverError;

/// Run a fallible backend operation with a deadline.
pub async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout(limit)),
    }
}

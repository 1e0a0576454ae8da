//! Monitor statistics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

use crate::health::sample::unix_now;

/// Counters updated by the monitor loop.
#[derive(Debug, Default)]
pub struct MonitorStats {
    total_checks: AtomicU64,
    failures: AtomicU64,
    consecutive_failures: AtomicU64,
    failovers_triggered: AtomicU64,
    last_check: AtomicU64,
    manual_override: AtomicBool,
}

/// Point-in-time copy of [`MonitorStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_checks: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
    pub failovers_triggered: u64,
    /// Seconds since the Unix epoch; `None` before the first cycle.
    pub last_check: Option<u64>,
    pub manual_override: bool,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&self, healthy: bool) {
        self.total_checks.fetch_add(1, Ordering::Relaxed);
        self.last_check.store(unix_now(), Ordering::Relaxed);
        if healthy {
            self.consecutive_failures.store(0, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
            self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_failover(&self) {
        self.failovers_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_manual_override(&self, enabled: bool) {
        self.manual_override.store(enabled, Ordering::Relaxed);
    }

    pub fn manual_override(&self) -> bool {
        self.manual_override.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let last_check = self.last_check.load(Ordering::Relaxed);
        StatsSnapshot {
            total_checks: self.total_checks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            failovers_triggered: self.failovers_triggered.load(Ordering::Relaxed),
            last_check: (last_check > 0).then_some(last_check),
            manual_override: self.manual_override(),
        }
    }
}

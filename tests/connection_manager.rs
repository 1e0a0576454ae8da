//! Connection manager behaviour against a scripted driver.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use backend_failover::connection::{
    BackendHandle, ConnectionError, ConnectionEvent, ConnectionManager, FailoverReason, OperatingMode,
};

mod common;

use common::{endpoints, manager, MockDriver};

#[tokio::test]
async fn test_primary_unreachable_falls_back() {
    let driver = MockDriver::new();
    driver.primary.set_unreachable(true);
    let manager = manager(&driver);

    let mode = manager.connect(OperatingMode::Primary).await.unwrap();

    assert_eq!(mode, OperatingMode::Fallback);
    assert_eq!(manager.mode(), OperatingMode::Fallback);
    assert!(manager.get_handle().is_some());
    assert_eq!(driver.primary.opens(), 1);
    assert_eq!(driver.fallback.opens(), 1);
}

#[tokio::test]
async fn test_failed_primary_ping_closes_unverified_handle() {
    let driver = MockDriver::new();
    driver.primary.ping_fails.store(true, Ordering::SeqCst);
    let manager = manager(&driver);

    manager.connect(OperatingMode::Primary).await.unwrap();

    let handles = driver.opened_handles();
    assert_eq!(handles.len(), 2);
    assert_eq!(handles[0].mode(), OperatingMode::Primary);
    assert!(handles[0].is_closed());
    assert_eq!(handles[1].mode(), OperatingMode::Fallback);
    assert!(!handles[1].is_closed());
    assert_eq!(manager.mode(), OperatingMode::Fallback);
}

#[tokio::test]
async fn test_both_unreachable_is_backend_unavailable() {
    let driver = MockDriver::new();
    driver.primary.set_unreachable(true);
    driver.fallback.set_unreachable(true);
    let manager = manager(&driver);

    let err = manager.connect(OperatingMode::Primary).await.unwrap_err();

    assert!(matches!(
        err,
        ConnectionError::BackendUnavailable { requested: OperatingMode::Primary, .. }
    ));
    assert!(manager.get_handle().is_none());
    assert!(!manager.is_connected());
    // Exactly one attempt per tier, no further cascading.
    assert_eq!(driver.primary.opens(), 1);
    assert_eq!(driver.fallback.opens(), 1);
}

#[tokio::test]
async fn test_fallback_failure_does_not_cascade() {
    let driver = MockDriver::new();
    driver.fallback.set_unreachable(true);
    let manager = manager(&driver);

    let err = manager.connect(OperatingMode::Fallback).await.unwrap_err();

    assert!(matches!(
        err,
        ConnectionError::BackendUnavailable { requested: OperatingMode::Fallback, .. }
    ));
    assert_eq!(driver.primary.opens(), 0);
    assert_eq!(driver.fallback.opens(), 1);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Primary).await.unwrap();
    let handle = manager.get_handle().unwrap();

    manager.disconnect().await;
    manager.disconnect().await;

    assert!(manager.get_handle().is_none());
    assert!(handle.is_closed());
    assert!(matches!(manager.require_handle(), Err(ConnectionError::NotConnected)));
}

#[tokio::test]
async fn test_disconnect_before_connect_is_noop() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    let mut events = manager.subscribe();

    manager.disconnect().await;

    assert!(manager.get_handle().is_none());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_failover_from_primary() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Primary).await.unwrap();
    let primary_handle = manager.get_handle().unwrap();
    let mut events = manager.subscribe();

    let mode = manager.failover(FailoverReason::BackendUnreachable).await.unwrap();

    assert_eq!(mode, OperatingMode::Fallback);
    assert_eq!(manager.mode(), OperatingMode::Fallback);
    assert!(primary_handle.is_closed());
    assert_eq!(manager.failover_count(), 1);

    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::Disconnected { mode: OperatingMode::Primary }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::Connected { mode: OperatingMode::Fallback }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::FailedOver {
            from: OperatingMode::Primary,
            to: OperatingMode::Fallback,
            reason: FailoverReason::BackendUnreachable,
        }
    );
}

#[tokio::test]
async fn test_failover_in_fallback_only_signals_degraded() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Fallback).await.unwrap();
    let handle = manager.get_handle().unwrap();
    let mut events = manager.subscribe();

    let err = manager.failover(FailoverReason::BackendUnreachable).await.unwrap_err();

    assert!(matches!(
        err,
        ConnectionError::DegradedNoFallback { mode: OperatingMode::Fallback, .. }
    ));
    assert_eq!(manager.mode(), OperatingMode::Fallback);
    assert!(!handle.is_closed());
    assert_eq!(driver.fallback.opens(), 1);
    assert_eq!(manager.failover_count(), 0);
    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::Degraded {
            mode: OperatingMode::Fallback,
            reason: FailoverReason::BackendUnreachable,
        }
    );
}

#[tokio::test]
async fn test_failover_observed_skips_replaced_handle() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Primary).await.unwrap();
    let stale = manager.get_handle().unwrap();
    manager.connect(OperatingMode::Primary).await.unwrap();
    let current = manager.get_handle().unwrap();

    let outcome = manager
        .failover_observed(&stale, FailoverReason::BackendUnreachable)
        .await
        .unwrap();

    assert_eq!(outcome, None);
    assert_eq!(manager.mode(), OperatingMode::Primary);
    assert_eq!(manager.failover_count(), 0);
    assert!(!current.is_closed());

    let outcome = manager
        .failover_observed(&current, FailoverReason::BackendUnreachable)
        .await
        .unwrap();
    assert_eq!(outcome, Some(OperatingMode::Fallback));
    assert!(current.is_closed());
}

#[tokio::test]
async fn test_failover_observed_after_disconnect_is_noop() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Primary).await.unwrap();
    let handle = manager.get_handle().unwrap();
    manager.disconnect().await;

    let outcome = manager
        .failover_observed(&handle, FailoverReason::BackendUnreachable)
        .await
        .unwrap();

    assert_eq!(outcome, None);
    assert!(!manager.is_connected());
    assert_eq!(driver.fallback.opens(), 0);
}

#[tokio::test]
async fn test_failed_failover_leaves_no_handle() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Primary).await.unwrap();
    driver.fallback.set_unreachable(true);

    let err = manager.failover(FailoverReason::BackendUnreachable).await.unwrap_err();

    assert!(matches!(err, ConnectionError::BackendUnavailable { .. }));
    assert!(manager.get_handle().is_none());
    assert_eq!(manager.mode(), OperatingMode::Primary);
}

#[tokio::test]
async fn test_explicit_connect_promotes_back_to_primary() {
    let driver = MockDriver::new();
    driver.primary.set_unreachable(true);
    let manager = manager(&driver);
    manager.connect(OperatingMode::Primary).await.unwrap();
    let fallback_handle = manager.get_handle().unwrap();

    driver.primary.set_unreachable(false);
    let mode = manager.connect(OperatingMode::Primary).await.unwrap();

    assert_eq!(mode, OperatingMode::Primary);
    assert_eq!(manager.mode(), OperatingMode::Primary);
    assert!(fallback_handle.is_closed());
    assert!(!manager.get_handle().unwrap().is_closed());
}

#[tokio::test]
async fn test_failed_reconnect_keeps_working_handle() {
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Fallback).await.unwrap();
    let handle = manager.get_handle().unwrap();

    driver.primary.set_unreachable(true);
    driver.fallback.open_fails.store(true, Ordering::SeqCst);
    let err = manager.connect(OperatingMode::Primary).await.unwrap_err();

    assert!(matches!(err, ConnectionError::BackendUnavailable { .. }));
    assert!(Arc::ptr_eq(&manager.get_handle().unwrap(), &handle));
    assert!(!handle.is_closed());
}

#[tokio::test]
async fn test_get_handle_never_returns_closed_handle_during_failover() {
    // Current-thread runtime: readers only interleave with the failover at
    // await points, so every observation below is exact.
    let driver = MockDriver::new();
    let manager = manager(&driver);
    manager.connect(OperatingMode::Primary).await.unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move {
                let mut observed = 0usize;
                for _ in 0..200 {
                    if let Some(handle) = manager.get_handle() {
                        assert!(!handle.is_closed(), "reader observed a closed handle");
                        observed += 1;
                    }
                    tokio::task::yield_now().await;
                }
                observed
            })
        })
        .collect();

    let failover = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.failover(FailoverReason::BackendUnreachable).await })
    };

    assert_eq!(failover.await.unwrap().unwrap(), OperatingMode::Fallback);
    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
}

#[tokio::test]
async fn test_concurrent_connects_are_serialized() {
    let driver = MockDriver::new();
    let manager = manager(&driver);

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.connect(OperatingMode::Primary).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), OperatingMode::Primary);
    }

    let published = manager.get_handle().unwrap();
    let live: Vec<_> = driver
        .opened_handles()
        .into_iter()
        .filter(|h| !h.is_closed())
        .collect();
    assert_eq!(live.len(), 1);
    assert!(!published.is_closed());
    assert_eq!(driver.primary.opens(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_hung_primary_times_out_into_fallback() {
    let driver = MockDriver::new();
    driver.primary.open_hangs.store(true, Ordering::SeqCst);
    let manager = Arc::new(ConnectionManager::new(
        driver.clone(),
        endpoints(),
        Duration::from_secs(5),
    ));

    let started = tokio::time::Instant::now();
    let mode = manager.connect(OperatingMode::Primary).await.unwrap();

    assert_eq!(mode, OperatingMode::Fallback);
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test]
async fn test_status_reports_members() {
    let driver = MockDriver::new();
    let manager = manager(&driver);

    let status = manager.status();
    assert!(!status.connected);
    assert_eq!(status.members, None);

    manager.connect(OperatingMode::Primary).await.unwrap();
    let status = manager.status();
    assert!(status.connected);
    assert_eq!(status.mode, OperatingMode::Primary);
    assert_eq!(
        status.members.as_deref(),
        Some("http://db1:28017,http://db2:28017,http://db3:28017")
    );
}

#[tokio::test]
async fn test_check_health_reports_ping_errors() {
    let driver = MockDriver::new();
    let manager = manager(&driver);

    let report = manager.check_health().await;
    assert!(!report.healthy);

    manager.connect(OperatingMode::Primary).await.unwrap();
    let report = manager.check_health().await;
    assert!(report.healthy);
    assert_eq!(report.status.unwrap().host, "primary-node");

    driver.primary.status_fails.store(true, Ordering::SeqCst);
    let report = manager.check_health().await;
    assert!(!report.healthy);
    assert!(report.error.unwrap().contains("serverStatus failed"));
    // Probing never changes state.
    assert_eq!(manager.mode(), OperatingMode::Primary);
    assert!(manager.is_connected());
}

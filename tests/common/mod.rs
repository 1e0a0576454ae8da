//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use backend_failover::config::HealthConfig;
use backend_failover::connection::endpoint::parse_address;
use backend_failover::connection::{
    BackendDriver, BackendHandle, ConnectionHandle, ConnectionManager, DriverError,
    EndpointDescriptor, EndpointSet, OperatingMode, ServerStatus,
};
use backend_failover::health::ThermalSensor;

/// Scripted behaviour of one simulated backend tier.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub open_fails: AtomicBool,
    pub ping_fails: AtomicBool,
    pub status_fails: AtomicBool,
    /// Block `open` for an hour.
    pub open_hangs: AtomicBool,
    /// Block `admin_ping` for an hour.
    pub ping_hangs: AtomicBool,
    /// Delay every `admin_ping` by this many milliseconds.
    pub ping_delay_ms: AtomicU64,
    pub opens: AtomicUsize,
    pub pings: AtomicUsize,
}

impl MockBackend {
    pub fn set_unreachable(&self, unreachable: bool) {
        self.open_fails.store(unreachable, Ordering::SeqCst);
        self.ping_fails.store(unreachable, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

/// Driver whose two tiers are controlled by [`MockBackend`] flags.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub primary: Arc<MockBackend>,
    pub fallback: Arc<MockBackend>,
    pub handles: Mutex<Vec<Arc<MockHandle>>>,
    next_id: AtomicU64,
}

impl MockDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn backend(&self, mode: OperatingMode) -> &Arc<MockBackend> {
        match mode {
            OperatingMode::Primary => &self.primary,
            OperatingMode::Fallback => &self.fallback,
        }
    }

    pub fn opened_handles(&self) -> Vec<Arc<MockHandle>> {
        self.handles.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendDriver for MockDriver {
    async fn open(
        &self,
        endpoint: &EndpointDescriptor,
        _connect_timeout: Duration,
    ) -> Result<ConnectionHandle, DriverError> {
        let backend = self.backend(endpoint.mode).clone();
        backend.opens.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if backend.open_hangs.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if backend.open_fails.load(Ordering::SeqCst) {
            return Err(DriverError::Unreachable(format!("{} refused", endpoint.describe())));
        }

        let handle = Arc::new(MockHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            endpoint: endpoint.clone(),
            backend,
            closed: AtomicBool::new(false),
        });
        self.handles.lock().unwrap().push(handle.clone());
        Ok(handle)
    }
}

#[derive(Debug)]
pub struct MockHandle {
    pub id: u64,
    endpoint: EndpointDescriptor,
    backend: Arc<MockBackend>,
    closed: AtomicBool,
}

impl MockHandle {
    pub fn mode(&self) -> OperatingMode {
        self.endpoint.mode
    }
}

#[async_trait]
impl BackendHandle for MockHandle {
    async fn admin_ping(&self) -> Result<(), DriverError> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        self.backend.pings.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.backend.ping_hangs.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let delay = self.backend.ping_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.backend.ping_fails.load(Ordering::SeqCst) {
            return Err(DriverError::Unreachable("ping failed".to_string()));
        }
        Ok(())
    }

    async fn admin_status(&self) -> Result<ServerStatus, DriverError> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        if self.backend.status_fails.load(Ordering::SeqCst) {
            return Err(DriverError::Protocol("serverStatus failed".to_string()));
        }
        Ok(ServerStatus {
            uptime_seconds: 42,
            host: format!("{}-node", self.endpoint.mode),
        })
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }
}

/// Sensor returning whatever the test sets.
#[derive(Debug, Default)]
pub struct FixedSensor {
    celsius: Mutex<Option<f64>>,
}

impl FixedSensor {
    pub fn new(celsius: Option<f64>) -> Arc<Self> {
        Arc::new(Self {
            celsius: Mutex::new(celsius),
        })
    }

    pub fn set(&self, celsius: Option<f64>) {
        *self.celsius.lock().unwrap() = celsius;
    }
}

#[async_trait]
impl ThermalSensor for FixedSensor {
    async fn read_cpu_temperature(&self) -> Option<f64> {
        *self.celsius.lock().unwrap()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

pub fn endpoints() -> EndpointSet {
    EndpointSet::new(
        EndpointDescriptor {
            mode: OperatingMode::Primary,
            members: vec![
                parse_address("db1:28017").unwrap(),
                parse_address("db2:28017").unwrap(),
                parse_address("db3:28017").unwrap(),
            ],
            replica_set: Some("rs0".to_string()),
        },
        EndpointDescriptor {
            mode: OperatingMode::Fallback,
            members: vec![parse_address("db-backup:28017").unwrap()],
            replica_set: None,
        },
    )
}

pub fn manager(driver: &Arc<MockDriver>) -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::new(
        driver.clone(),
        endpoints(),
        Duration::from_secs(5),
    ))
}

pub fn health_config() -> HealthConfig {
    HealthConfig {
        interval_secs: 30,
        check_timeout_secs: 5,
        critical_temperature_celsius: 80.0,
        ..HealthConfig::default()
    }
}

/// Knobs of a fake backend admin API served over HTTP.
#[derive(Debug)]
pub struct AdminBackend {
    pub healthy: AtomicBool,
    pub status_body: Mutex<String>,
    pub pings: AtomicUsize,
}

impl AdminBackend {
    pub fn new(host: &str) -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(true),
            status_body: Mutex::new(format!(r#"{{"uptime": 1234.5, "host": "{}"}}"#, host)),
            pings: AtomicUsize::new(0),
        })
    }
}

/// Serve `/admin/ping` and `/admin/status` on an ephemeral port.
pub async fn start_admin_backend(backend: Arc<AdminBackend>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let backend = backend.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let request = String::from_utf8_lossy(&buf[..n]);
                        let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                        let healthy = backend.healthy.load(Ordering::SeqCst);
                        let (status, body) = match path.as_str() {
                            "/admin/ping" => {
                                backend.pings.fetch_add(1, Ordering::SeqCst);
                                if healthy {
                                    ("200 OK", r#"{"ok": 1}"#.to_string())
                                } else {
                                    ("503 Service Unavailable", "down".to_string())
                                }
                            }
                            "/admin/status" if healthy => {
                                ("200 OK", backend.status_body.lock().unwrap().clone())
                            }
                            "/admin/status" => ("503 Service Unavailable", "down".to_string()),
                            _ => ("404 Not Found", "not found".to_string()),
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

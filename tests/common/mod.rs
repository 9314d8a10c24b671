//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use edge_gateway::config::{GatewayConfig, RouteConfig};
use edge_gateway::http::HttpServer;
use edge_gateway::lifecycle::Shutdown;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Handle to a running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Read the request head (up to the blank line).
async fn read_head(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return Some(String::from_utf8_lossy(&buf).into_owned());
        }
    }
}

/// Start a backend that answers every request with a JSON echo of the
/// request line and the identity headers it received.
pub async fn start_echo_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        let Some(head) = read_head(&mut socket).await else {
                            return;
                        };
                        counter.fetch_add(1, Ordering::SeqCst);

                        let mut lines = head.split("\r\n");
                        let mut request_line = lines.next().unwrap_or("").split(' ');
                        let method = request_line.next().unwrap_or("");
                        let target = request_line.next().unwrap_or("");

                        let mut echo = serde_json::json!({
                            "method": method,
                            "target": target,
                        });
                        for line in lines {
                            if let Some((name, value)) = line.split_once(':') {
                                let name = name.trim().to_ascii_lowercase();
                                if name.starts_with("x-user-") || name == "x-request-id" {
                                    echo[name] = serde_json::json!(value.trim());
                                }
                            }
                        }

                        let body = echo.to_string();
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
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

    MockBackend { addr, hits }
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn route(name: &str, prefix: &str, backend: SocketAddr, authenticate: bool) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        path_prefix: prefix.into(),
        backend: backend.to_string(),
        priority: 0,
        authenticate,
        ssrf_protection: true,
    }
}

pub fn gateway_config(routes: Vec<RouteConfig>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.secret = TEST_SECRET.into();
    config.routes = routes;
    config
}

/// Running gateway bound on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl TestGateway {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    // Listener is already bound; give the accept loop a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestGateway {
        addr,
        shutdown,
        updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

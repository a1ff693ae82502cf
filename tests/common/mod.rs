//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use relay::config::{BackendEntry, RelayConfig, RouteConfig, ServiceConfig};
use relay::load_balancer::backend::Backend;
use relay::routing::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a mock backend that answers with the status and body returned by `f`,
/// which receives the request line (e.g. `GET /path HTTP/1.1`).
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let Some(request_line) = read_request_line(&mut socket).await else {
                    return;
                };
                let (status, body) = f(request_line).await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a mock backend that announces a `Content-Length` of `length`, sends
/// `partial` and then holds the connection open without sending the rest.
pub async fn start_stalling_backend(partial: &'static str, length: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_request_line(&mut socket).await.is_none() {
                    return;
                }
                let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", length);
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(partial.as_bytes()).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    addr
}

/// Start a mock backend that always answers with `name`.
pub async fn start_mock_backend(name: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| async move { (200, name.to_string()) }).await
}

/// Start a mock backend that echoes the request line.
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|line| async move { (200, line) }).await
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_request_line(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).lines().next().map(str::to_string)
}

/// Config with one service per entry, routed by the given patterns.
pub fn config(services: &[(&str, &str, Vec<SocketAddr>)], routes: &[(&str, &str)]) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.services = services
        .iter()
        .map(|(name, algorithm, addrs)| ServiceConfig {
            name: name.to_string(),
            algorithm: algorithm.to_string(),
            backends: addrs
                .iter()
                .map(|a| BackendEntry::Url(format!("http://{}", a)))
                .collect(),
        })
        .collect();
    config.routes = routes
        .iter()
        .map(|(path, service)| RouteConfig {
            path: path.to_string(),
            service: service.to_string(),
        })
        .collect();
    config
}

/// Backends of a service, in registration order.
pub fn backends(routes: &Router, service: &str) -> Vec<Arc<Backend>> {
    routes
        .services()
        .get(service)
        .unwrap()
        .balancer()
        .backends()
        .to_vec()
}

/// Wait until every backend of `service` has no request in flight.
pub async fn wait_idle(routes: &Router, service: &str) -> bool {
    for _ in 0..50 {
        if backends(routes, service).iter().all(|b| b.active_connections() == 0) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// HTTP client that bypasses any environment proxy and never pools.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

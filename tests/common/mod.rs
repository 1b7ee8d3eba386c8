//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::Method;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use waypoint::config::ServerConfig;
use waypoint::{Finished, HttpServer, RawRequest, Service, Shutdown};

/// A server bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<ServerConfig>,
    pub handle: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start `service` behind the HTTP adapter on 127.0.0.1:0.
#[allow(dead_code)]
pub async fn start_server(service: Service, mut config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(service, config);
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    // The listener is already bound; give the accept loop a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

/// HTTP client that never reuses connections between tests.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub fn get(service: &Service, target: &str) -> Finished {
    service.handle(RawRequest::new(Method::GET, target))
}

#[allow(dead_code)]
pub fn send(service: &Service, method: Method, target: &str) -> Finished {
    service.handle(RawRequest::new(method, target))
}

#[allow(dead_code)]
pub fn text(finished: &Finished) -> String {
    finished.body.clone().into_text()
}

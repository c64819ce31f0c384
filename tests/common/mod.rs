//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use scipnet::config::ServerConfig;
use scipnet::lifecycle::{build_services, Shutdown};
use scipnet::routing::RouteTableBuilder;
use scipnet::rpc::RpcServer;
use scipnet::session::MemorySessionStore;
use scipnet::HttpServer;

/// A running server on ephemeral ports. Shut down on drop.
pub struct TestServer {
    pub http: SocketAddr,
    #[allow(dead_code)]
    pub rpc: SocketAddr,
    pub sessions: Arc<MemorySessionStore>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.http, path)
    }

    #[allow(dead_code)]
    pub fn rpc_url(&self) -> String {
        format!("http://{}/", self.rpc)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start both bindings for `config` with application routes from `extend`.
pub async fn start_server<F>(config: ServerConfig, extend: F) -> TestServer
where
    F: FnOnce(RouteTableBuilder) -> RouteTableBuilder,
{
    let services = build_services(&config, extend).unwrap();
    let shutdown = Shutdown::new();

    let http_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let rpc_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http = http_listener.local_addr().unwrap();
    let rpc = rpc_listener.local_addr().unwrap();

    let server = HttpServer::new(&config, services.dispatcher.clone());
    tokio::spawn(server.run(http_listener, shutdown.subscribe()));
    let server = RpcServer::new(&config, services.dispatcher.clone());
    tokio::spawn(server.run(rpc_listener, shutdown.subscribe()));

    TestServer {
        http,
        rpc,
        sessions: services.sessions,
        shutdown,
    }
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

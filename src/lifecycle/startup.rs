//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the session store, route table and dispatcher from config
//! - Start the expired-session sweeper
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::handlers::standard_routes;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::net::tls::load_tls_config;
use crate::routing::{Dispatcher, HandlerContext, RouteError, RouteTableBuilder};
use crate::rpc::RpcServer;
use crate::session::{MemorySessionStore, SessionGate};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),

    #[error("invalid address {0:?}")]
    Address(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The core objects every listener shares.
#[derive(Clone)]
pub struct Services {
    pub sessions: Arc<MemorySessionStore>,
    pub dispatcher: Dispatcher,
}

/// Build the dispatcher for `config`. `extend` registers the routes the
/// embedding application supplies (login processing, page rendering).
pub fn build_services<F>(config: &ServerConfig, extend: F) -> Result<Services, StartupError>
where
    F: FnOnce(RouteTableBuilder) -> RouteTableBuilder,
{
    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(config.sessions.ttl_secs)));
    let routes = extend(standard_routes(config)?).build()?;
    tracing::info!(
        routes = routes.len(),
        page_fallback = routes.has_page_fallback(),
        "Route table built"
    );

    let context = HandlerContext::new(SessionGate::new(sessions.clone()));
    Ok(Services {
        sessions,
        dispatcher: Dispatcher::new(routes, context),
    })
}

/// Periodically drop expired sessions until shutdown.
pub fn spawn_session_purger(
    store: Arc<MemorySessionStore>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let purged = store.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, remaining = store.len(), "Expired sessions purged");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

/// Run every configured listener until `shutdown` fires.
pub async fn serve(config: &ServerConfig, services: Services, shutdown: &Shutdown) -> Result<(), StartupError> {
    let purger = spawn_session_purger(
        services.sessions.clone(),
        Duration::from_secs(config.sessions.purge_interval_secs),
        shutdown.subscribe(),
    );

    let http = HttpServer::new(config, services.dispatcher.clone());
    let http_rx = shutdown.subscribe();
    let http_task = async {
        match &config.listener.tls {
            Some(tls) => {
                let addr = parse_addr(&config.listener.bind_address)?;
                let rustls = load_tls_config(&tls.cert_path, &tls.key_path).await?;
                http.run_tls(addr, rustls, http_rx).await?;
            }
            None => {
                let listener = TcpListener::bind(&config.listener.bind_address).await?;
                http.run(listener, http_rx).await?;
            }
        }
        Ok::<(), StartupError>(())
    };

    let rpc_rx = shutdown.subscribe();
    let rpc_task = async {
        if config.rpc.enabled {
            let listener = TcpListener::bind(&config.rpc.bind_address).await?;
            RpcServer::new(config, services.dispatcher.clone())
                .run(listener, rpc_rx)
                .await?;
        }
        Ok::<(), StartupError>(())
    };

    let result = tokio::try_join!(http_task, rpc_task).map(|_| ());
    if result.is_err() {
        // Bring down whatever is still running.
        shutdown.trigger();
    }
    if let Err(e) = purger.await {
        tracing::warn!(error = %e, "Session purger ended abnormally");
    }
    result
}

fn parse_addr(value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::Address(value.to_string()))
}

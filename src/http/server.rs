//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router feeding every path into the dispatcher
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Turn raw requests into `NormalizedRequest`s
//! - Map dispatch faults to a generic 500
//! - Serve plain or TLS, with graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, ConnectInfo, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{Method, NormalizedRequest, RawRequest, X_REQUEST_ID};
use crate::routing::Dispatcher;

/// Grace period for in-flight TLS connections on shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// Raw HTTP(S) binding.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState { dispatcher };
        let router = Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes));

        Self {
            router: with_middleware(router, config),
        }
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            wait_for(shutdown).await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Layers shared by every listener. The request ID is assigned outermost so
/// tracing and handlers both see it. The body limit sits outside the
/// timeout, whose responses need a default body.
#[allow(deprecated)]
pub(crate) fn with_middleware(router: Router, config: &ServerConfig) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
    )
}

pub(crate) async fn wait_for(mut shutdown: broadcast::Receiver<()>) {
    // A closed channel also means shutdown.
    let _ = shutdown.recv().await;
}

pub(crate) fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn dispatch_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    verb: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Some(method) = Method::from_http(&verb) else {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    };

    let request_id = request_id(&headers);

    // 413 for an oversized body, 400 for one that could not be read.
    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(request_id = ?request_id, error = %rejection, "Failed to read request body");
            return (rejection.status(), "Request body rejected").into_response();
        }
    };

    let cookies: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let raw = RawRequest {
        method,
        path: uri.path().to_string(),
        cookie_header: (!cookies.is_empty()).then(|| cookies.join("; ")),
        content_type,
        body,
        client: addr.ip(),
        request_id,
    };

    match state.dispatcher.dispatch(NormalizedRequest::from_http(raw)).await {
        Ok(response) => response.into_response(),
        // Already logged by the dispatcher; the cause stays server-side.
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
    }
}

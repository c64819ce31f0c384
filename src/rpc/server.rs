//! JSON-RPC listener.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::Value as JsonValue;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::http::params::Params;
use crate::http::path::RoutePath;
use crate::http::request::{Method, NormalizedRequest};
use crate::http::server::{request_id, wait_for, with_middleware};
use crate::observability::metrics;
use crate::routing::{Dispatcher, RouteTable};
use crate::rpc::types::{
    DispatchResult, RpcRequest, RpcResponse, INTERNAL_ERROR, INVALID_REQUEST, JSONRPC_VERSION, PARSE_ERROR,
};

/// Router exposing the dispatcher as JSON-RPC at `POST /`.
pub fn build_rpc_router(dispatcher: Dispatcher, config: &ServerConfig) -> Router {
    let router = Router::new().route("/", post(rpc_handler)).with_state(dispatcher);
    with_middleware(router, config)
}

pub struct RpcServer {
    router: Router,
}

impl RpcServer {
    pub fn new(config: &ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            router: build_rpc_router(dispatcher, config),
        }
    }

    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "JSON-RPC server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("JSON-RPC server stopped");
        Ok(())
    }
}

async fn rpc_handler(
    State(dispatcher): State<Dispatcher>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<RpcResponse> {
    Json(handle_call(&dispatcher, addr.ip(), request_id(&headers), &body).await)
}

async fn handle_call(dispatcher: &Dispatcher, peer: IpAddr, request_id: Option<String>, body: &[u8]) -> RpcResponse {
    let envelope: JsonValue = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Unparsable JSON-RPC call");
            return failure(JsonValue::Null, PARSE_ERROR, "Parse error");
        }
    };

    let id = envelope.get("id").cloned().unwrap_or(JsonValue::Null);
    let call = match serde_json::from_value::<RpcRequest>(envelope) {
        Ok(call) if call.jsonrpc == JSONRPC_VERSION => call,
        _ => return failure(id, INVALID_REQUEST, "Invalid Request"),
    };

    let request = to_request(dispatcher.routes(), call, peer, request_id);
    match dispatcher.dispatch(request).await {
        Ok(response) => RpcResponse::success(id, DispatchResult::from(&response)),
        Err(e) => failure(id, INTERNAL_ERROR, format!("Internal error in {}", e.route)),
    }
}

fn failure(id: JsonValue, code: i64, message: impl Into<String>) -> RpcResponse {
    metrics::record_rpc_error(code);
    RpcResponse::failure(id, code, message)
}

/// Build the request a call stands for. A supplied `ip` overrides the peer
/// address, since callers of this binding are front servers.
fn to_request(routes: &RouteTable, call: RpcRequest, peer: IpAddr, request_id: Option<String>) -> NormalizedRequest {
    let route = RoutePath::parse(&call.method);
    let method = method_for(routes, &route);

    let client = match call.params.ip.as_deref().map(str::parse::<IpAddr>) {
        Some(Ok(ip)) => ip,
        Some(Err(_)) => {
            tracing::debug!(ip = ?call.params.ip, "Ignoring unparsable client address");
            peer
        }
        None => peer,
    };

    NormalizedRequest::new(method, route)
        .with_client(client)
        .with_cookies(call.params.cookies)
        .with_body(Params::from_json_object(&call.params.body))
        .with_params(Params::from_json_object(&call.params.params))
        .with_request_id(request_id)
}

/// The table a method name belongs to; unknown names are reads.
fn method_for(routes: &RouteTable, route: &RoutePath) -> Method {
    route
        .exact_name()
        .and_then(|name| routes.method_of(&name))
        .or_else(|| route.system_name().and_then(|name| routes.method_of(&name)))
        .unwrap_or(Method::Read)
}

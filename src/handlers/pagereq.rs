//! Page request forwarding.
//!
//! The caller's body is forwarded to the page-request service with the
//! session id replaced by the resolved username (null when anonymous). The
//! service's result is returned verbatim as JSON.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value as JsonValue};

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::http::request::NormalizedRequest;
use crate::http::response::ResponseBuilder;
use crate::routing::{Handler, HandlerContext, HandlerResult};
use crate::rpc::RpcClient;
use crate::session::SESSION_ID_FIELD;

pub const PAGEREQ_METHOD: &str = "pagereq";

/// `errorCode` the service uses for its own faults.
const SERVICE_FAULT: i64 = -1;

#[derive(Debug, Clone)]
pub struct PagereqHandler {
    client: RpcClient,
}

impl PagereqHandler {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    pub fn from_config(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = RpcClient::new(&upstream.url, Duration::from_secs(timeouts.upstream_secs))?;
        Ok(Self::new(client))
    }
}

impl Handler for PagereqHandler {
    fn call(&self, request: NormalizedRequest, ctx: HandlerContext) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            let session = ctx.sessions().resolve_request(&request).await;

            let mut args: Map<String, JsonValue> = request
                .body()
                .iter()
                .filter(|(key, _)| *key != SESSION_ID_FIELD)
                .map(|(key, value)| (key.to_string(), value.to_json()))
                .collect();
            args.insert(
                "username".to_string(),
                session.username().map_or(JsonValue::Null, JsonValue::from),
            );

            let result = self.client.call(PAGEREQ_METHOD, JsonValue::Object(args)).await?;

            if result.get("errorCode").and_then(JsonValue::as_i64) == Some(SERVICE_FAULT) {
                tracing::error!(
                    request_id = %request.request_id(),
                    error = %result.get("error").unwrap_or(&JsonValue::Null),
                    "Page request service reported an internal fault"
                );
            }

            Ok(ResponseBuilder::new().json(&result).build())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::{routing::post, Json, Router};
    use serde_json::json;

    use crate::http::params::Params;
    use crate::http::path::RoutePath;
    use crate::http::request::Method;
    use crate::routing::HandlerError;
    use crate::session::{MemorySessionStore, SessionGate};

    /// JSON-RPC service echoing its params back as the result.
    async fn start_echo_service() -> SocketAddr {
        let app = Router::new().route(
            "/",
            post(|Json(call): Json<JsonValue>| async move {
                Json(json!({"jsonrpc": "2.0", "result": call["params"], "id": call["id"]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn handler(addr: SocketAddr) -> PagereqHandler {
        PagereqHandler::new(RpcClient::new(format!("http://{}/", addr), Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_forwards_with_username() {
        let addr = start_echo_service().await;
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let client = "10.0.0.7".parse().unwrap();
        let session_id = store.create_session("ada", client);
        let ctx = HandlerContext::new(SessionGate::new(store));

        let mut body = Params::new();
        body.insert_raw(SESSION_ID_FIELD, session_id);
        body.insert_raw("page", "scp-173");
        body.insert_raw("revision", "4");
        let request = NormalizedRequest::new(Method::Write, RoutePath::parse("/sys/pagereq"))
            .with_body(body)
            .with_client(client);

        let response = handler(addr).call(request, ctx).await.unwrap();
        assert_eq!(response.mime_type(), "application/json");
        let echoed: JsonValue = serde_json::from_str(&response.body().unwrap().to_text()).unwrap();
        assert_eq!(echoed, json!({"page": "scp-173", "revision": 4, "username": "ada"}));
    }

    #[tokio::test]
    async fn test_anonymous_username_is_null() {
        let addr = start_echo_service().await;
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let ctx = HandlerContext::new(SessionGate::new(store));
        let request = NormalizedRequest::new(Method::Write, RoutePath::parse("/sys/pagereq"));

        let response = handler(addr).call(request, ctx).await.unwrap();
        let echoed: JsonValue = serde_json::from_str(&response.body().unwrap().to_text()).unwrap();
        assert_eq!(echoed, json!({"username": null}));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_fault() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let ctx = HandlerContext::new(SessionGate::new(store));
        let request = NormalizedRequest::new(Method::Write, RoutePath::parse("/sys/pagereq"));

        let err = handler(addr).call(request, ctx).await.unwrap_err();
        assert!(matches!(err, HandlerError::Upstream(_)));
    }
}

//! Outbound JSON-RPC calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::routing::HandlerError;
use crate::rpc::types::JSONRPC_VERSION;

#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl From<RpcClientError> for HandlerError {
    fn from(err: RpcClientError) -> Self {
        match err {
            RpcClientError::Transport(e) => HandlerError::Upstream(e),
            other => HandlerError::InvalidUpstream(other.to_string()),
        }
    }
}

/// JSON-RPC 2.0 client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and return its `result` member.
    pub async fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, RpcClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": method,
            "params": params,
            "id": id,
        });

        tracing::trace!(url = %self.url, method = %method, id, "Calling JSON-RPC method");
        let reply: JsonValue = self
            .http
            .post(&self.url)
            .json(&envelope)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        into_result(reply)
    }
}

fn into_result(mut reply: JsonValue) -> Result<JsonValue, RpcClientError> {
    let Some(object) = reply.as_object_mut() else {
        return Err(RpcClientError::Malformed("reply is not an object".into()));
    };

    if let Some(error) = object.remove("error").filter(|e| !e.is_null()) {
        return Err(RpcClientError::Remote {
            code: error.get("code").and_then(JsonValue::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(JsonValue::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    object
        .remove("result")
        .ok_or_else(|| RpcClientError::Malformed("reply has neither result nor error".into()))
}

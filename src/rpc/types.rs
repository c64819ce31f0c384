//! JSON-RPC envelopes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::http::response::{Cookie, NormalizedResponse, Payload};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const INTERNAL_ERROR: i64 = -32603;

/// An inbound call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: RpcParams,
    #[serde(default)]
    pub id: JsonValue,
}

/// Request parts carried by a call in place of HTTP framing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcParams {
    pub body: Map<String, JsonValue>,
    pub cookies: BTreeMap<String, String>,
    pub params: Map<String, JsonValue>,
    /// Address of the original client, when the caller is a front server.
    pub ip: Option<String>,
}

/// Serialized form of a `NormalizedResponse`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    #[serde(rename = "type")]
    pub mime_type: String,
    pub send: Option<SendBody>,
    pub redirect: Option<String>,
    pub cookie: Vec<Cookie>,
    pub status: u16,
}

impl From<&NormalizedResponse> for DispatchResult {
    fn from(response: &NormalizedResponse) -> Self {
        Self {
            mime_type: response.mime_type().to_string(),
            send: response.body().map(SendBody::from),
            redirect: response.redirect().map(str::to_string),
            cookie: response.cookies().to_vec(),
            status: response.status().as_u16(),
        }
    }
}

/// A response body on the wire: a string when it is valid UTF-8, otherwise
/// an array of byte values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendBody {
    Text(String),
    Binary(Vec<u8>),
}

impl From<&Payload> for SendBody {
    fn from(payload: &Payload) -> Self {
        match payload {
            Payload::Text(text) => SendBody::Text(text.clone()),
            Payload::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => SendBody::Text(text.to_string()),
                Err(_) => SendBody::Binary(bytes.to_vec()),
            },
        }
    }
}

impl SendBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SendBody::Text(text) => text.as_bytes(),
            SendBody::Binary(bytes) => bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// An outbound reply; exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DispatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: JsonValue,
}

impl RpcResponse {
    pub fn success(id: JsonValue, result: DispatchResult) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: JsonValue, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

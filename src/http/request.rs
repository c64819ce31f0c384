//! Request normalization.
//!
//! # Responsibilities
//! - Turn raw transport input (path, cookie header, body bytes) into a
//!   transport-neutral `NormalizedRequest`
//! - Classify the route (root, system, page)
//! - Carry the request ID for log correlation
//!
//! # Design Decisions
//! - Pure transformation; malformed input degrades to empty values
//! - Both transports (HTTP and JSON-RPC) produce the same record

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use axum::body::Bytes;

use crate::http::params::{Params, Value};
use crate::http::parse::{parse_body, parse_cookies};
use crate::http::path::RoutePath;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Read-style vs write-style calls. Each has its own route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Read,
    Write,
}

impl Method {
    /// Map an HTTP method. Verbs other than GET/HEAD/POST have no mapping.
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        match *method {
            axum::http::Method::GET | axum::http::Method::HEAD => Some(Method::Read),
            axum::http::Method::POST => Some(Method::Write),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Read => "read",
            Method::Write => "write",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw input as a transport received it.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub path: String,
    pub cookie_header: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub client: IpAddr,
    pub request_id: Option<String>,
}

/// Transport-neutral request handed to handlers.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    method: Method,
    client: IpAddr,
    cookies: BTreeMap<String, String>,
    body: Params,
    params: Params,
    route: RoutePath,
    request_id: Option<String>,
}

impl NormalizedRequest {
    /// An empty request for `route`, from an unspecified client.
    pub fn new(method: Method, route: RoutePath) -> Self {
        let params = route.path_params();
        Self {
            method,
            client: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            cookies: BTreeMap::new(),
            body: Params::new(),
            params,
            route,
            request_id: None,
        }
    }

    /// Normalize raw HTTP input.
    pub fn from_http(raw: RawRequest) -> Self {
        let route = RoutePath::parse(&raw.path);
        let cookies = raw
            .cookie_header
            .as_deref()
            .map(parse_cookies)
            .unwrap_or_default();
        let body = parse_body(&raw.body, raw.content_type.as_deref());

        Self::new(raw.method, route)
            .with_client(raw.client)
            .with_cookies(cookies)
            .with_body(body)
            .with_request_id(raw.request_id)
    }

    pub fn with_client(mut self, client: IpAddr) -> Self {
        self.client = client;
        self
    }

    pub fn with_cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_body(mut self, body: Params) -> Self {
        self.body = body;
        self
    }

    /// Merge extra parameters over the path-derived ones.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn client(&self) -> IpAddr {
        self.client
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Params {
        &self.body
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn route(&self) -> &RoutePath {
        &self.route
    }

    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(method: Method, path: &str) -> RawRequest {
        RawRequest {
            method,
            path: path.to_string(),
            cookie_header: None,
            content_type: None,
            body: Bytes::new(),
            client: "10.0.0.1".parse().unwrap(),
            request_id: Some("req-1".into()),
        }
    }

    #[test]
    fn test_from_http_system_route() {
        let mut input = raw(Method::Write, "/sys/pagereq/page/3");
        input.cookie_header = Some("sessionId=abc; theme=dark%20mode".into());
        input.content_type = Some("application/x-www-form-urlencoded".into());
        input.body = Bytes::from_static(b"name=vote&sessionId=abc");

        let req = NormalizedRequest::from_http(input);
        assert_eq!(req.method(), Method::Write);
        assert_eq!(req.route().full_name(), "sys/pagereq/page/3");
        assert_eq!(req.params().get_i64("page"), Some(3));
        assert_eq!(req.cookie("theme"), Some("dark mode"));
        assert_eq!(req.body().get_str("sessionId"), Some("abc"));
        assert_eq!(req.client().to_string(), "10.0.0.1");
        assert_eq!(req.request_id(), "req-1");
    }

    #[test]
    fn test_from_http_page_route() {
        let req = NormalizedRequest::from_http(raw(Method::Read, "/some-article"));
        assert_eq!(req.route(), &RoutePath::Page { slug: "some-article".into() });
        assert!(req.params().is_empty());
        assert!(req.body().is_empty());
    }

    #[test]
    fn test_http_method_mapping() {
        assert_eq!(Method::from_http(&axum::http::Method::GET), Some(Method::Read));
        assert_eq!(Method::from_http(&axum::http::Method::HEAD), Some(Method::Read));
        assert_eq!(Method::from_http(&axum::http::Method::POST), Some(Method::Write));
        assert_eq!(Method::from_http(&axum::http::Method::DELETE), None);
    }
}

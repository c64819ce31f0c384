//! Response building and conversion.
//!
//! # Responsibilities
//! - Collect handler output (cookies, redirect or body, MIME type, status)
//! - Freeze it into an immutable `NormalizedResponse`
//! - Render it as an HTTP response for the raw transport
//!
//! # Design Decisions
//! - Redirect and body share one slot: the last write wins, with a warning
//! - Cookies are append-only and keep their order
//! - Redirects use 303 See Other so a POST is never replayed

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

/// Default MIME type of a response.
pub const DEFAULT_MIME_TYPE: &str = "text/html";

/// Characters escaped in Set-Cookie values (mirrors `encodeURIComponent`).
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'=');

/// A pending `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(rename = "maxAge")]
    pub max_age: u64,
}

impl Cookie {
    pub fn header_value(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path=/",
            self.name,
            utf8_percent_encode(&self.value, COOKIE_VALUE),
            self.max_age
        )
    }
}

/// Body payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Binary(b) => b,
        }
    }

    /// Text form; binary payloads are decoded lossily.
    pub fn to_text(&self) -> String {
        match self {
            Payload::Text(s) => s.clone(),
            Payload::Binary(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(b))
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Binary(b)
    }
}

/// What the response ultimately does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Empty,
    Redirect(String),
    Body(Payload),
}

/// Accumulates handler output.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: StatusCode,
    cookies: Vec<Cookie>,
    outcome: Outcome,
    mime_type: String,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            cookies: Vec::new(),
            outcome: Outcome::Empty,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl ToString, max_age: u64) -> Self {
        self.cookies.push(Cookie {
            name: name.into(),
            value: value.to_string(),
            max_age,
        });
        self
    }

    /// Redirect the caller. Replaces any body set earlier.
    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if let Outcome::Body(payload) = &self.outcome {
            tracing::warn!(
                redirect = %url,
                discarded_bytes = payload.len(),
                "Redirect overrides a body sent earlier"
            );
        }
        self.outcome = Outcome::Redirect(url);
        self
    }

    /// Send a body. Replaces any redirect set earlier.
    pub fn send(mut self, payload: impl Into<Payload>) -> Self {
        if let Outcome::Redirect(url) = &self.outcome {
            tracing::warn!(discarded_redirect = %url, "Body overrides a redirect set earlier");
        }
        self.outcome = Outcome::Body(payload.into());
        self
    }

    /// Serialize `value` as the body and switch the MIME type to JSON.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        let text = serde_json::to_string(value).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize JSON body");
            "null".to_string()
        });
        self.send(text).mime_type("application/json")
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> NormalizedResponse {
        NormalizedResponse {
            status: self.status,
            cookies: self.cookies,
            outcome: self.outcome,
            mime_type: self.mime_type,
        }
    }
}

/// Immutable handler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResponse {
    status: StatusCode,
    cookies: Vec<Cookie>,
    outcome: Outcome,
    mime_type: String,
}

impl NormalizedResponse {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn redirect(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Redirect(url) => Some(url),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Payload> {
        match &self.outcome {
            Outcome::Body(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for NormalizedResponse {
    fn into_response(self) -> Response {
        let mut response = match self.outcome {
            Outcome::Redirect(url) => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = if self.status.is_success() {
                    StatusCode::SEE_OTHER
                } else {
                    self.status
                };
                match HeaderValue::from_str(&url) {
                    Ok(location) => {
                        response.headers_mut().insert(header::LOCATION, location);
                    }
                    Err(_) => {
                        tracing::warn!(redirect = %url, "Dropping unencodable redirect target");
                    }
                }
                response
            }
            Outcome::Body(payload) => {
                let body = match payload {
                    Payload::Text(s) => Body::from(s),
                    Payload::Binary(b) => Body::from(b),
                };
                let mut response = Response::new(body);
                *response.status_mut() = self.status;
                if let Ok(mime) = HeaderValue::from_str(&self.mime_type) {
                    response.headers_mut().insert(header::CONTENT_TYPE, mime);
                }
                response
            }
            Outcome::Empty => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = self.status;
                response
            }
        };

        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.header_value()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(cookie = %cookie.name, "Dropping unencodable cookie"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let response = ResponseBuilder::new().build();
        assert_eq!(response.mime_type(), "text/html");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.outcome(), &Outcome::Empty);
        assert!(response.cookies().is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let response = ResponseBuilder::new().send("hello").redirect("/sys/login").build();
        assert_eq!(response.redirect(), Some("/sys/login"));
        assert!(response.body().is_none());

        let response = ResponseBuilder::new().redirect("/sys/login").send("hello").build();
        assert_eq!(response.redirect(), None);
        assert_eq!(response.body(), Some(&Payload::Text("hello".into())));
    }

    #[test]
    fn test_cookies_keep_order() {
        let response = ResponseBuilder::new()
            .cookie("sessionId", 12, 3600)
            .cookie("theme", "dark mode", 60)
            .build();
        let names: Vec<&str> = response.cookies().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["sessionId", "theme"]);
        assert_eq!(response.cookies()[0].value, "12");
        assert_eq!(
            response.cookies()[1].header_value(),
            "theme=dark%20mode; Max-Age=60; Path=/"
        );
    }

    #[test]
    fn test_into_http_redirect() {
        let response = ResponseBuilder::new()
            .redirect("/")
            .cookie("a", "1", 10)
            .build()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(response.headers()[header::SET_COOKIE], "a=1; Max-Age=10; Path=/");
    }

    #[test]
    fn test_into_http_body() {
        let response = ResponseBuilder::new()
            .json(&serde_json::json!({"errorCode": 0}))
            .build()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}

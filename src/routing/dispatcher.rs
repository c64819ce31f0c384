//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the handler for a normalized request
//! - Inject the page slug for page routes
//! - Synthesize not-found responses
//! - Record per-dispatch logs and metrics
//!
//! # Design Decisions
//! - Handler errors are not caught here; they surface as `DispatchError`
//!   at the transport's failure boundary
//! - Not-found never fails: read-style calls are redirected to the root,
//!   write-style calls get a 404 error body

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::http::path::RoutePath;
use crate::http::request::{Method, NormalizedRequest};
use crate::http::response::{NormalizedResponse, ResponseBuilder};
use crate::observability::metrics;
use crate::routing::handler::{HandlerContext, HandlerError};
use crate::routing::names::PAGE_ID_PARAM;
use crate::routing::router::{Resolution, RouteTable};

/// A handler failed; fatal for the request.
#[derive(Debug, Error)]
#[error("handler for {route} failed: {source}")]
pub struct DispatchError {
    pub route: String,
    #[source]
    pub source: HandlerError,
}

/// Resolves and runs handlers. Cheap to clone; shares the route table.
#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
    context: HandlerContext,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, context: HandlerContext) -> Self {
        Self {
            routes: Arc::new(routes),
            context,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Dispatch one request to completion.
    pub async fn dispatch(&self, request: NormalizedRequest) -> Result<NormalizedResponse, DispatchError> {
        let start = Instant::now();
        let method = request.method();
        let request_id = request.request_id().to_string();

        let (route, kind, result) = match self.routes.resolve(method, request.route()) {
            Resolution::Route { name, handler } => {
                tracing::debug!(request_id = %request_id, method = %method, route = %name, "Dispatching route");
                let result = handler.call(request, self.context.clone()).await;
                (name, "route", result)
            }
            Resolution::Page { slug, handler } => {
                tracing::debug!(request_id = %request_id, method = %method, page = %slug, "Dispatching page");
                let request = request.with_param(PAGE_ID_PARAM, slug.clone());
                let result = handler.call(request, self.context.clone()).await;
                (slug, "page", result)
            }
            Resolution::NotFound => {
                let route = request.route().to_string();
                tracing::warn!(request_id = %request_id, method = %method, route = %route, "No route matched");
                let response = not_found(method, request.route());
                metrics::record_dispatch(method, "not_found", response.status().as_u16(), start);
                return Ok(response);
            }
        };

        match result {
            Ok(response) => {
                metrics::record_dispatch(method, kind, response.status().as_u16(), start);
                Ok(response)
            }
            Err(source) => {
                tracing::error!(request_id = %request_id, route = %route, error = %source, "Handler failed");
                metrics::record_dispatch(method, kind, StatusCode::INTERNAL_SERVER_ERROR.as_u16(), start);
                Err(DispatchError { route, source })
            }
        }
    }
}

/// Response for a request no handler claims.
fn not_found(method: Method, route: &RoutePath) -> NormalizedResponse {
    match (method, route) {
        // Redirecting the root to itself would loop.
        (Method::Read, RoutePath::Root) => ResponseBuilder::new()
            .status(StatusCode::NOT_FOUND)
            .send("Not Found")
            .mime_type("text/plain")
            .build(),
        (Method::Read, _) => ResponseBuilder::new().redirect("/").build(),
        (Method::Write, route) => ResponseBuilder::new()
            .status(StatusCode::NOT_FOUND)
            .json(&json!({
                "errorCode": 404,
                "error": format!("No such route: {}", route),
            }))
            .build(),
    }
}

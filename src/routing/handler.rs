//! Handler abstraction.
//!
//! Every handler, synchronous or not, is driven through the same
//! future-returning `call`, so the dispatcher never distinguishes them.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use thiserror::Error;

use crate::http::request::NormalizedRequest;
use crate::http::response::NormalizedResponse;
use crate::session::SessionGate;

/// Faults inside a handler. These are fatal for the request.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Local storage (static files etc.) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A backing service could not be reached.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// A backing service answered with something unusable.
    #[error("invalid upstream response: {0}")]
    InvalidUpstream(String),

    #[error("{0}")]
    Internal(String),
}

pub type HandlerResult = Result<NormalizedResponse, HandlerError>;

/// Capabilities handed to every handler call.
#[derive(Clone)]
pub struct HandlerContext {
    sessions: SessionGate,
}

impl HandlerContext {
    pub fn new(sessions: SessionGate) -> Self {
        Self { sessions }
    }

    /// The session gate, for handlers that need a caller identity.
    pub fn sessions(&self) -> &SessionGate {
        &self.sessions
    }
}

/// Run, given a request, eventually producing a response.
pub trait Handler: Send + Sync {
    fn call(&self, request: NormalizedRequest, ctx: HandlerContext) -> BoxFuture<'_, HandlerResult>;
}

struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(NormalizedRequest, HandlerContext) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: NormalizedRequest, ctx: HandlerContext) -> BoxFuture<'_, HandlerResult> {
        Box::pin((self.0)(request, ctx))
    }
}

struct SyncHandler<F>(F);

impl<F> Handler for SyncHandler<F>
where
    F: Fn(&NormalizedRequest, &HandlerContext) -> HandlerResult + Send + Sync,
{
    fn call(&self, request: NormalizedRequest, ctx: HandlerContext) -> BoxFuture<'_, HandlerResult> {
        Box::pin(future::ready((self.0)(&request, &ctx)))
    }
}

/// Wrap an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(NormalizedRequest, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Wrap a synchronous closure as a handler.
pub fn sync_handler<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&NormalizedRequest, &HandlerContext) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(SyncHandler(f))
}

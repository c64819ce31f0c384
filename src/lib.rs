//! Request dispatcher for a wiki platform.
//!
//! Inbound calls arrive over raw HTTP(S) or JSON-RPC, are normalized into a
//! transport-neutral request, resolved against a write-once route table
//! (system routes first, then the page-slug fallback) and answered with an
//! immutable response value. Handlers consult the session gate and the
//! permission bitfield when they need a caller identity.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod permissions;
pub mod routing;
pub mod rpc;
pub mod session;

// Collaborators
pub mod handlers;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Dispatcher;

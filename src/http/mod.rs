//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, client address)
//!     → request.rs (path.rs classification, parse.rs cookies/body,
//!                   params.rs coercion → NormalizedRequest)
//!     → routing::Dispatcher
//!     → response.rs (NormalizedResponse → status, Set-Cookie, Location)
//!     → Send to client
//! ```

pub mod params;
pub mod parse;
pub mod path;
pub mod request;
pub mod response;
pub mod server;

pub use params::{Params, Value};
pub use path::RoutePath;
pub use request::{Method, NormalizedRequest, RawRequest, X_REQUEST_ID};
pub use response::{Cookie, NormalizedResponse, Payload, ResponseBuilder};
pub use server::HttpServer;

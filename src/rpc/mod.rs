//! JSON-RPC 2.0 binding.
//!
//! # Data Flow
//! ```text
//! POST / {"jsonrpc":"2.0","method":"sys/login","params":{...},"id":1}
//!     → server.rs (envelope checks, build NormalizedRequest)
//!     → Dispatcher (same route table as the raw HTTP binding)
//!     → DispatchResult {type, send, redirect, cookie, status}
//!       (`send` is a string, or an array of bytes when not UTF-8)
//! ```
//!
//! # Design Decisions
//! - The method name is the route name; Read or Write is taken from the
//!   table that owns the name, unknown names are Read (page fallback)
//! - Served on its own listener, so "/" never collides with page slugs
//! - `client.rs` is the outbound side used by forwarding handlers and the CLI

pub mod client;
pub mod server;
pub mod types;

pub use client::{RpcClient, RpcClientError};
pub use server::{build_rpc_router, RpcServer};
pub use types::{DispatchResult, RpcError, RpcParams, RpcRequest, RpcResponse, SendBody, JSONRPC_VERSION};

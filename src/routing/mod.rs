//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! NormalizedRequest (method, route classification)
//!     → router.rs (exact route → system sub-route → page fallback)
//!     → handler.rs (run the handler, awaiting sync and async alike)
//!     → dispatcher.rs (inject pageid, synthesize not-found, metrics)
//!     → NormalizedResponse or DispatchError
//!
//! Route table construction (at startup):
//!     RouteTableBuilder (read table, write table, page fallback)
//!     → reject duplicate or cross-method names
//!     → freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes are registered once at startup and never change
//! - Read and write tables are disjoint; no cross-method fallthrough
//! - First match wins; the page fallback is only consulted for page paths
//! - Handler failures propagate; expected denials travel as responses

pub mod dispatcher;
pub mod handler;
pub mod names;
pub mod router;

pub use dispatcher::{DispatchError, Dispatcher};
pub use handler::{handler_fn, sync_handler, Handler, HandlerContext, HandlerError, HandlerResult};
pub use router::{Resolution, RouteError, RouteTable, RouteTableBuilder};

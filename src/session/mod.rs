//! Session gate subsystem.
//!
//! # Data Flow
//! ```text
//! handler (page-request, permission-gated mutation)
//!     → gate.rs (session id from body or cookie, client address)
//!     → SessionStore (external collaborator: id + address → username)
//!     → SessionStore (username → permission set)
//!     → SessionContext or Denial
//! ```
//!
//! # Design Decisions
//! - The dispatcher never consults sessions; handlers do, through the
//!   `HandlerContext` capability
//! - A session presented from a different address reads as anonymous
//! - Denials become ordinary responses, never errors

pub mod gate;
pub mod memory;

pub use gate::{Denial, SessionContext, SessionGate, SessionStore, SESSION_ID_FIELD};
pub use memory::MemorySessionStore;

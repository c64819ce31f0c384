//! Permission subsystem.
//!
//! # Data Flow
//! ```text
//! stored integer (role/user record)
//!     → set.rs (decode over the default set)
//!     → PermissionSet (has / set)
//!     → set.rs (encode back to integer)
//!     → stored integer
//! ```
//!
//! # Design Decisions
//! - Canonical order of `PermissionName::ALL` defines bit positions
//! - New permissions are only ever appended, so stored integers stay valid
//! - Lookups by unknown name degrade to `false` / no-op instead of failing

pub mod name;
pub mod set;

pub use name::{PermissionName, UnknownPermission, NUM_PERMISSIONS};
pub use set::PermissionSet;

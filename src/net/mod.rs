//! Network layer.
//!
//! Plain TCP is accepted by `axum::serve`; this module only prepares the
//! optional TLS configuration for `axum-server`.

pub mod tls;

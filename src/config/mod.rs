//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → read once at startup to build listeners, route table, sessions
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the route table is built from it once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AssetConfig, ListenerConfig, ObservabilityConfig, RpcConfig, ServerConfig, ServicesConfig,
    SessionConfig, TimeoutConfig, TlsConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Check asset names produce usable route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - File existence is not checked; a missing asset fails its request

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{kind} name {name:?} must be non-empty and contain no '/'")]
    InvalidAssetName { kind: &'static str, name: String },

    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.rpc.enabled {
        check_address(&mut errors, "rpc.bind_address", &config.rpc.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_bytes" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs" });
    }
    if config.sessions.ttl_secs == 0 {
        errors.push(ValidationError::Zero { field: "sessions.ttl_secs" });
    }
    if config.sessions.purge_interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "sessions.purge_interval_secs" });
    }

    if let Some(pagereq) = &config.services.pagereq {
        if url::Url::parse(&pagereq.url).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: "services.pagereq.url",
                value: pagereq.url.clone(),
            });
        }
    }

    for (kind, names) in [("font", &config.assets.fonts), ("image", &config.assets.images)] {
        for name in names.keys() {
            if name.is_empty() || name.contains('/') {
                errors.push(ValidationError::InvalidAssetName {
                    kind,
                    name: name.clone(),
                });
            }
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

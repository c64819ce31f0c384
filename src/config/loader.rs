//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "Configuration file loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(!config.rpc.enabled);
        assert!(config.services.pagereq.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:8443"

            [listener.tls]
            cert_path = "certs/cert.pem"
            key_path = "certs/key.pem"

            [rpc]
            enabled = true
            bind_address = "127.0.0.1:9001"

            [assets]
            favicon = "static/favicon.ico"
            login_page = "static/login.html"

            [assets.fonts]
            "Sans.woff" = "static/fonts/Sans.woff"

            [services.pagereq]
            url = "http://127.0.0.1:3001/"
            "#,
        )
        .unwrap();

        assert!(config.listener.tls.is_some());
        assert!(config.rpc.enabled);
        assert_eq!(config.assets.fonts.len(), 1);
        assert_eq!(config.services.pagereq.unwrap().url, "http://127.0.0.1:3001/");
    }

    #[test]
    fn test_invalid_config_reports_validation() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("timeouts.request_secs"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sessions]\nttl_secs = 60").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sessions.ttl_secs, 60);

        let missing = load_config(Path::new("/nonexistent/scipnet.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}

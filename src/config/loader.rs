//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate a TOML document.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendEntry;

    const EXAMPLE: &str = r#"
[global]
addr = "0.0.0.0"
port = 9000

[timeouts]
read_secs = 5

[[services]]
name = "api"
backends = ["http://127.0.0.1:3001", { url = "http://127.0.0.1:3002", weight = 3 }]

[[services]]
name = "admin"
algorithm = "least_connections"
backends = ["http://127.0.0.1:3003"]

[[routes]]
path = "/"
service = "api"

[[routes]]
path = "/admin"
service = "admin"
"#;

    #[test]
    fn test_parse_example() {
        let config = parse_config(EXAMPLE).unwrap();
        assert_eq!(config.global.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.timeouts.read_secs, 5);
        assert_eq!(config.timeouts.write_secs, 30);
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].algorithm, "round_robin");
        assert_eq!(
            config.services[0].backends[1],
            BackendEntry::Weighted {
                url: "http://127.0.0.1:3002".to_string(),
                weight: 3
            }
        );
        assert_eq!(config.services[1].algorithm, "least_connections");
        assert_eq!(config.routes[1].path, "/admin");
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.global.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.timeouts.shutdown_grace_secs, 15);
        assert_eq!(config.logging.level, "info");
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("[global\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors_reported() {
        let err = parse_config(
            r#"
[[services]]
name = "api"
algorithm = "fastest"

[[routes]]
path = "/web"
service = "web"
"#,
        )
        .unwrap_err();

        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("fastest"));
        assert!(message.contains("web"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

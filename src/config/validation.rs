//! Bootstrap configuration validation.
//!
//! Serde handles the syntactic checks; this module covers value ranges and
//! cross-field rules. All failures are collected, not just the first.

use std::fmt;
use std::net::SocketAddr;

use tracing_subscriber::filter::LevelFilter;

use crate::config::schema::BootstrapConfig;

/// A single semantic problem in the bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BootstrapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.base_config.group.trim().is_empty() {
        errors.push(ValidationError::new("base_config.group", "must not be empty"));
    }

    let server = &config.nacos_server;
    if server.ip_addr.trim().is_empty() {
        errors.push(ValidationError::new("nacos_server.ip_addr", "must not be empty"));
    }
    if server.port == 0 {
        errors.push(ValidationError::new("nacos_server.port", "must be non-zero"));
    }
    if server.scheme != "http" && server.scheme != "https" {
        errors.push(ValidationError::new(
            "nacos_server.scheme",
            format!("unsupported scheme '{}'", server.scheme),
        ));
    }

    let client = &config.nacos_client;
    if client.timeout_ms == 0 {
        errors.push(ValidationError::new("nacos_client.timeout_ms", "must be non-zero"));
    }
    if client.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "nacos_client.poll_interval_ms",
            "must be non-zero",
        ));
    }
    if client.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::new(
            "nacos_client.log_level",
            format!("unknown level '{}'", client.log_level),
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BootstrapConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BootstrapConfig::default();
        config.base_config.group = " ".into();
        config.nacos_server.ip_addr.clear();
        config.nacos_client.timeout_ms = 0;
        config.nacos_client.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "base_config.group",
                "nacos_server.ip_addr",
                "nacos_client.timeout_ms",
                "nacos_client.log_level",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = BootstrapConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}

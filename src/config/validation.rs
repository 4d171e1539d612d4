//! Configuration validation.
//!
//! Serde handles the syntax; this module checks values. All errors are
//! collected rather than stopping at the first one.

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
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

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(addr) = &config.listener.redirect_address {
        check_address(&mut errors, "listener.redirect_address", addr);
    }
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    if config.gateway.mapping_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("gateway.mapping_path", "must not be empty"));
    }

    let transport = &config.transport;
    for (field, value) in [
        ("transport.dial_timeout_secs", transport.dial_timeout_secs),
        ("transport.idle_timeout_secs", transport.idle_timeout_secs),
        ("transport.tls_handshake_timeout_secs", transport.tls_handshake_timeout_secs),
        ("transport.socket_connect_timeout_secs", transport.socket_connect_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }
    if transport.max_idle_connections == 0 {
        errors.push(ValidationError::new("transport.max_idle_connections", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{}'", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not an address".to_string();
        config.listener.tls = Some(TlsConfig {
            cert_path: String::new(),
            key_path: "key.pem".to_string(),
        });
        config.transport.dial_timeout_secs = 0;
        config.transport.max_idle_connections = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "listener.tls.cert_path",
                "transport.dial_timeout_secs",
                "transport.max_idle_connections",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nope".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}

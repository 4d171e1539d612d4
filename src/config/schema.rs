//! Configuration schema definitions.
//!
//! This module defines the gateway's own settings. Routing itself lives in
//! the separate mapping document (see `mapping.rs`).
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, redirect listener).
    pub listener: ListenerConfig,

    /// Routing behavior shared by every request.
    pub gateway: RoutingConfig,

    /// Shared outbound transport settings.
    pub transport: TransportConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:443").
    pub bind_address: String,

    /// Optional TLS configuration. Without it the gateway serves plain HTTP.
    pub tls: Option<TlsConfig>,

    /// Optional plain-HTTP address answering with redirects to HTTPS.
    pub redirect_address: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:443".to_string(),
            tls: None,
            redirect_address: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Routing behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Host/backend mapping file, watched for changes.
    pub mapping_path: PathBuf,

    /// Add a Strict-Transport-Security header to every response.
    pub hsts: bool,

    /// Log the resolved URL of every outbound request.
    pub debug: bool,

    /// Hostname served for the `any` and path-prefix entries.
    pub default_hostname: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mapping_path: PathBuf::from("mapping.yml"),
            hsts: false,
            debug: false,
            default_hostname: None,
        }
    }
}

/// Outbound transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP dial timeout in seconds.
    pub dial_timeout_secs: u64,

    /// TCP keep-alive interval in seconds.
    pub keepalive_secs: u64,

    /// Maximum idle pooled connections kept per backend.
    pub max_idle_connections: usize,

    /// Idle pooled connection timeout in seconds.
    pub idle_timeout_secs: u64,

    /// TLS handshake timeout in seconds.
    pub tls_handshake_timeout_secs: u64,

    /// Skip verification of backend TLS certificates.
    pub tls_skip_verify: bool,

    /// Connect timeout for socket and `host:port` backends in seconds.
    pub socket_connect_timeout_secs: u64,
}

impl TransportConfig {
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn tls_handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_handshake_timeout_secs)
    }

    pub fn socket_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_connect_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            dial_timeout_secs: 30,
            keepalive_secs: 30,
            max_idle_connections: 100,
            idle_timeout_secs: 90,
            tls_handshake_timeout_secs: 10,
            tls_skip_verify: false,
            socket_connect_timeout_secs: 5,
        }
    }
}

/// Timeout configuration for process lifecycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for in-flight requests to drain on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

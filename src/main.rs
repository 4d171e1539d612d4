//! Host-based reverse-proxy gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::Router ──▶ proxy::Handler ──▶ Backend
//!                                            │                  │
//!                                            ▼                  ▼
//!                                     routing::RouteTable  proxy::OutboundTransport
//!                                            ▲                (shared pool)
//!                                            │
//!     mapping.yml ──▶ config::watcher ──▶ reload::task ──▶ reload::coordinator
//!     SIGHUP ─────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use host_gateway::config::validation::validate_config;
use host_gateway::config::{load_config, ConfigError, GatewayConfig, MappingWatcher, TlsConfig};
use host_gateway::http::{redirect, GatewayServer};
use host_gateway::lifecycle::{signals, Shutdown};
use host_gateway::net::load_tls_config;
use host_gateway::observability::{logging, metrics};
use host_gateway::proxy::{OutboundTransport, Resolver};
use host_gateway::reload::{reload_from_file, ReloadCoordinator, ReloadTask};
use host_gateway::routing::{RouteTable, Router};

#[derive(Parser, Debug)]
#[command(name = "host-gateway")]
#[command(about = "Host-based reverse-proxy gateway", long_about = None)]
struct Cli {
    /// Gateway configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    addr: Option<String>,

    /// Plain HTTP listen address that redirects to HTTPS
    #[arg(long)]
    http: Option<String>,

    /// Host/backend mapping file (YAML)
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// TLS certificate (PEM)
    #[arg(long, requires = "key")]
    cert: Option<String>,

    /// TLS private key (PEM)
    #[arg(long, requires = "cert")]
    key: Option<String>,

    /// Skip verification of backend TLS certificates
    #[arg(long)]
    tls_skip_verify: bool,

    /// Send Strict-Transport-Security on every response
    #[arg(long)]
    hsts: bool,

    /// Default hostname, added to the served-hostname list
    #[arg(long)]
    hostname: Option<String>,

    /// Log every outbound request URL
    #[arg(long)]
    debug: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Load the config file (or defaults) and apply flag overrides.
    fn into_config(self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => GatewayConfig::default(),
        };

        if let Some(addr) = self.addr {
            config.listener.bind_address = addr;
        }
        if let Some(http) = self.http {
            config.listener.redirect_address = Some(http);
        }
        if let (Some(cert_path), Some(key_path)) = (self.cert, self.key) {
            config.listener.tls = Some(TlsConfig { cert_path, key_path });
        }
        if let Some(mapping) = self.mapping {
            config.gateway.mapping_path = mapping;
        }
        if let Some(hostname) = self.hostname {
            config.gateway.default_hostname = Some(hostname);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        config.transport.tls_skip_verify |= self.tls_skip_verify;
        config.gateway.hsts |= self.hsts;
        config.gateway.debug |= self.debug;

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    logging::init_logging(&config.observability)?;

    tracing::info!("host-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    // Both ring and the server-side default provider may be compiled in.
    let _ = rustls::crypto::ring::default_provider().install_default();

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    let transport = Arc::new(OutboundTransport::new(&config.transport)?);
    let table = Arc::new(RouteTable::new());
    let resolver = Resolver::new(
        transport,
        config.transport.socket_connect_timeout(),
        config.gateway.debug,
    );
    let coordinator = ReloadCoordinator::new(Arc::clone(&table), resolver);

    let mapping_path = config.gateway.mapping_path.clone();
    let default_hostname = config.gateway.default_hostname.clone();
    reload_from_file(&coordinator, &mapping_path, default_hostname.as_deref()).await?;

    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let _watcher = MappingWatcher::new(&mapping_path, trigger_tx.clone()).run()?;
    let reload_task = ReloadTask::new(coordinator, mapping_path, default_hostname, trigger_rx);
    tokio::spawn(reload_task.run(shutdown.clone()));

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::listen(signal_shutdown.clone(), trigger_tx).await {
            tracing::error!(error = %e, "Unable to install signal handlers");
            signal_shutdown.trigger();
        }
    });

    if let Some(address) = &config.listener.redirect_address {
        let listener = TcpListener::bind(address).await?;
        let redirect_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = redirect::run(listener, redirect_shutdown).await {
                tracing::error!(error = %e, "HTTP redirect listener failed");
            }
        });
    }

    let router = Router::new(table, config.gateway.hsts);
    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let server = GatewayServer::new(router, shutdown.clone(), grace);

    let result = match &config.listener.tls {
        Some(tls) => {
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            let rustls_config =
                load_tls_config(tls.cert_path.as_ref(), tls.key_path.as_ref()).await?;
            server.run_tls(addr, rustls_config).await
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            server.run(listener).await
        }
    };

    shutdown.trigger();
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}

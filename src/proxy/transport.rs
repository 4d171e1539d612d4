//! Shared outbound transport for HTTP/HTTPS backends.
//!
//! # Responsibilities
//! - Own the process-wide pooled client used by every HTTP/HTTPS proxy
//! - Close idle pooled connections after a transport failure or a 5xx
//! - Rewrite `Set-Cookie` paths for handlers that ask for it
//!
//! # Design Decisions
//! - Closing idle connections swaps in a freshly built client; the old pool
//!   and its idle connections are dropped once in-flight requests release it
//! - The breaker is coarse: one bad response recycles the whole shared pool

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{Request, Response, Uri};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tower::Service;

use crate::config::TransportConfig;
use crate::observability::metrics;
use crate::proxy::cookie::rewrite_set_cookie_paths;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connector used by the shared pooled client.
pub type PooledConnector = ConnectTimeout<HttpsConnector<HttpConnector>>;

/// The pooled client type behind the transport.
pub type PooledClient = Client<PooledConnector, Body>;

/// Error type for outbound round-trips.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("backend request failed: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),

    #[error("invalid TLS configuration: {0}")]
    Tls(#[from] rustls::Error),
}

/// The process-wide pooled transport with connection-health management.
pub struct OutboundTransport {
    client: ArcSwap<PooledClient>,
    config: TransportConfig,
    tls: ClientConfig,
    resets: AtomicU64,
}

impl OutboundTransport {
    /// Build the transport and its first connection pool.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let tls = client_tls_config(config.tls_skip_verify)?;
        let client = build_client(config, &tls);

        tracing::debug!(
            max_idle = config.max_idle_connections,
            idle_timeout_secs = config.idle_timeout_secs,
            tls_skip_verify = config.tls_skip_verify,
            "Outbound transport initialized"
        );

        Ok(Self {
            client: ArcSwap::from_pointee(client),
            config: config.clone(),
            tls,
            resets: AtomicU64::new(0),
        })
    }

    /// Execute one request through the shared pool.
    ///
    /// Transport failures and 5xx responses recycle the idle pool. A 5xx is
    /// still returned to the caller.
    pub async fn round_trip(
        &self,
        req: Request<Body>,
        set_cookie_path: bool,
    ) -> Result<Response<Incoming>, TransportError> {
        let client = self.client.load_full();

        let mut response = match client.request(req).await {
            Ok(response) => response,
            Err(e) => {
                self.close_idle_connections();
                tracing::warn!(error = %e, "Unable to get response from target server");
                return Err(TransportError::Client(e));
            }
        };

        if response.status().as_u16() >= 500 {
            self.close_idle_connections();
        }

        if set_cookie_path {
            rewrite_set_cookie_paths(response.headers_mut());
        }

        Ok(response)
    }

    /// Drop every idle pooled connection by replacing the pool.
    pub fn close_idle_connections(&self) {
        self.client.store(Arc::new(build_client(&self.config, &self.tls)));
        let resets = self.resets.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::record_pool_reset();
        tracing::debug!(resets, "Closed idle pooled connections");
    }

    /// Number of times the idle pool has been closed.
    pub fn pool_resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for OutboundTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundTransport")
            .field("config", &self.config)
            .field("resets", &self.pool_resets())
            .finish()
    }
}

fn build_client(config: &TransportConfig, tls: &ClientConfig) -> PooledClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(config.dial_timeout()));
    http.set_keepalive(Some(config.keepalive()));
    // Dual-stack dialing: fall back to the other address family quickly.
    http.set_happy_eyeballs_timeout(Some(Duration::from_millis(300)));

    let https = HttpsConnectorBuilder::new()
        .with_tls_config(tls.clone())
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    let connector = ConnectTimeout {
        inner: https,
        timeout: config
            .dial_timeout()
            .saturating_add(config.tls_handshake_timeout()),
    };

    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(config.idle_timeout())
        .pool_timer(TokioTimer::new())
        .build(connector)
}

fn client_tls_config(skip_verify: bool) -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    if skip_verify {
        return Ok(builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(SkipServerVerification(provider)))
            .with_no_client_auth());
    }

    let mut roots = rustls::RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        tracing::warn!(error = %error, "Unable to load native root certificate");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(added, ignored, "Loaded native root certificates");

    Ok(builder.with_root_certificates(roots).with_no_client_auth())
}

/// Bounds the whole connect (dial plus TLS handshake) of the inner connector.
#[derive(Debug, Clone)]
pub struct ConnectTimeout<C> {
    inner: C,
    timeout: Duration,
}

impl<C> Service<Uri> for ConnectTimeout<C>
where
    C: Service<Uri>,
    C::Future: Send + 'static,
    C::Error: Into<BoxError>,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let timeout = self.timeout;
        let connecting = self.inner.call(dst);
        Box::pin(async move {
            match tokio::time::timeout(timeout, connecting).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(format!("connect timed out after {:?}", timeout).into()),
            }
        })
    }
}

/// Certificate verifier used when `tls_skip_verify` is set.
#[derive(Debug)]
struct SkipServerVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum app around the gateway router
//! - Wire up middleware (request ID, tracing)
//! - Serve plain HTTP or TLS with graceful shutdown
//!
//! # Design Decisions
//! - A single fallback handler; all routing happens in `routing::Router`
//! - In-flight requests get a grace period after shutdown is triggered

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, Response};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::lifecycle::Shutdown;
use crate::routing::Router as GatewayRouter;

/// Gateway HTTP server.
pub struct GatewayServer {
    app: axum::Router,
    shutdown: Shutdown,
    grace: Duration,
}

impl GatewayServer {
    pub fn new(router: GatewayRouter, shutdown: Shutdown, grace: Duration) -> Self {
        Self {
            app: Self::build_app(router),
            shutdown,
            grace,
        }
    }

    /// Build the axum app with all middleware layers.
    pub fn build_app(router: GatewayRouter) -> axum::Router {
        axum::Router::new()
            .fallback(gateway_handler)
            .with_state(router)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Serve plain HTTP on `listener`.
    pub async fn run(self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let signal = self.shutdown.clone();
        let serve = axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { signal.wait().await })
        .into_future();

        let shutdown = self.shutdown;
        let grace = self.grace;
        tokio::select! {
            result = serve => result?,
            _ = async move {
                shutdown.wait().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(grace = ?grace, "Grace period elapsed, closing remaining connections");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` with the given rustls config.
    pub async fn run_tls(self, addr: SocketAddr, tls: RustlsConfig) -> std::io::Result<()> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let watcher = handle.clone();
        let shutdown = self.shutdown.clone();
        let grace = self.grace;
        tokio::spawn(async move {
            shutdown.wait().await;
            watcher.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

async fn gateway_handler(State(router): State<GatewayRouter>, req: Request<Body>) -> Response<Body> {
    let client_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    router.dispatch(req, client_addr).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    use crate::routing::RouteTable;

    #[tokio::test]
    async fn test_miss_gets_404_and_request_id() {
        let app = GatewayServer::build_app(GatewayRouter::new(Arc::new(RouteTable::new()), true));
        let req = Request::builder()
            .uri("/")
            .header(header::HOST, "a.test")
            .body(Body::empty())
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().contains_key("x-request-id"));
        assert!(res.headers().contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = Shutdown::new();
        let server = GatewayServer::new(
            GatewayRouter::new(Arc::new(RouteTable::new()), false),
            shutdown.clone(),
            Duration::from_secs(1),
        );
        let handle = tokio::spawn(server.run(listener));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}

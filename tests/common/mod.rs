//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};

use host_gateway::config::{parse_mapping, TransportConfig};
use host_gateway::proxy::{OutboundTransport, Resolver};
use host_gateway::{GatewayServer, ReloadCoordinator, RouteTable, Router, Shutdown};

/// Read one request head and answer with it as the body, then close.
async fn echo_head<S>(mut socket: S, extra_headers: &'static str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    let end = head.windows(4).position(|w| w == b"\r\n\r\n").unwrap_or(head.len());
    let body = &head[..end];

    let response = format!(
        "HTTP/1.1 200 OK\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n",
        extra_headers,
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.write_all(body).await;
    let _ = socket.shutdown().await;
}

/// Start a TCP backend that echoes each request head back as the body.
///
/// `extra_headers` is written verbatim into every response (CRLF-terminated lines).
pub async fn start_echo_backend(extra_headers: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(echo_head(socket, extra_headers));
        }
    });
    addr
}

/// Start a unix-socket backend that echoes each request head back as the body.
pub async fn start_unix_echo_backend(path: &Path) {
    let listener = UnixListener::bind(path).unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(echo_head(socket, ""));
        }
    });
}

/// Start a keep-alive HTTP/1.1 backend that counts accepted connections.
///
/// Requests to `/fail` get a 503, everything else a 200 with body `ok`.
pub async fn start_keepalive_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
                    let (status, body) = if req.uri().path() == "/fail" {
                        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
                    } else {
                        (StatusCode::OK, "ok")
                    };
                    let mut res = Response::new(Full::new(body.as_bytes()));
                    *res.status_mut() = status;
                    Ok::<_, Infallible>(res)
                });
                let _ = http1::Builder::new()
                    .keep_alive(true)
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    (addr, connections)
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub table: Arc<RouteTable>,
    pub transport: Arc<OutboundTransport>,
    pub coordinator: ReloadCoordinator,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway serving `mapping` (YAML).
pub async fn start_gateway(mapping: &str, hsts: bool) -> TestGateway {
    let transport = Arc::new(OutboundTransport::new(&TransportConfig::default()).unwrap());
    let table = Arc::new(RouteTable::new());
    let resolver = Resolver::new(Arc::clone(&transport), Duration::from_secs(5), false);
    let coordinator = ReloadCoordinator::new(Arc::clone(&table), resolver);
    coordinator.apply(&parse_mapping(mapping).unwrap()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(
        Router::new(Arc::clone(&table), hsts),
        shutdown.clone(),
        Duration::from_secs(1),
    );
    tokio::spawn(server.run(listener));

    TestGateway {
        addr,
        table,
        transport,
        coordinator,
        shutdown,
    }
}

/// A client that never pools, so each request is a fresh gateway connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

//! Forwarding to a fixed socket address.
//!
//! Backends given as a unix socket path, an `@abstract` name or a bare
//! `host:port` are reached by dialing that one address for every new
//! connection, whatever host the request names.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, uri::Scheme, HeaderValue, Request, Response, Uri, Version};
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use tokio::net::{TcpStream, UnixStream};
use tower::Service;

use crate::http::response;
use crate::proxy::headers;

/// Where a socket proxy dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketAddress {
    /// `host:port`, network "tcp".
    Tcp(String),
    /// Filesystem unix socket, network "unix".
    Unix(PathBuf),
    /// Linux abstract-namespace socket, network "unix". Holds the raw name.
    Abstract(Vec<u8>),
}

impl SocketAddress {
    /// Address for an `@name` target.
    ///
    /// A NUL terminator is appended to the name so the address length matches
    /// servers (uwsgi among them) that count it.
    pub fn abstract_name(name: &str) -> Self {
        let mut raw = name.as_bytes().to_vec();
        raw.push(0);
        SocketAddress::Abstract(raw)
    }

    pub fn network(&self) -> &'static str {
        match self {
            SocketAddress::Tcp(_) => "tcp",
            SocketAddress::Unix(_) | SocketAddress::Abstract(_) => "unix",
        }
    }

    async fn connect(&self) -> io::Result<SocketConnection> {
        match self {
            SocketAddress::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str()).await?;
                stream.set_nodelay(true)?;
                Ok(SocketConnection::Tcp(TokioIo::new(stream)))
            }
            SocketAddress::Unix(path) => {
                let stream = UnixStream::connect(path).await?;
                Ok(SocketConnection::Unix(TokioIo::new(stream)))
            }
            SocketAddress::Abstract(name) => {
                let stream = connect_abstract(name.clone()).await?;
                Ok(SocketConnection::Unix(TokioIo::new(stream)))
            }
        }
    }

    /// Dial with a connect timeout.
    pub async fn dial(&self, timeout: Duration) -> Result<SocketConnection, ConnectError> {
        match tokio::time::timeout(timeout, self.connect()).await {
            Ok(result) => result.map_err(|source| ConnectError::Io {
                address: self.to_string(),
                source,
            }),
            Err(_) => Err(ConnectError::Timeout {
                address: self.to_string(),
                timeout,
            }),
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketAddress::Tcp(addr) => write!(f, "{}", addr),
            SocketAddress::Unix(path) => write!(f, "{}", path.display()),
            SocketAddress::Abstract(name) => {
                let trimmed = name.strip_suffix(b"\0").unwrap_or(name);
                write!(f, "@{}", String::from_utf8_lossy(trimmed))
            }
        }
    }
}

#[cfg(target_os = "linux")]
async fn connect_abstract(name: Vec<u8>) -> io::Result<UnixStream> {
    use std::os::linux::net::SocketAddrExt;

    let stream = tokio::task::spawn_blocking(move || {
        let addr = std::os::unix::net::SocketAddr::from_abstract_name(&name)?;
        std::os::unix::net::UnixStream::connect_addr(&addr)
    })
    .await
    .map_err(io::Error::other)??;

    stream.set_nonblocking(true)?;
    UnixStream::from_std(stream)
}

#[cfg(not(target_os = "linux"))]
async fn connect_abstract(_name: Vec<u8>) -> io::Result<UnixStream> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "abstract unix sockets are only available on linux",
    ))
}

/// Error type for socket dials.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("dial {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    #[error("dial {address}: {source}")]
    Io {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// An established connection to a socket backend.
pub enum SocketConnection {
    Tcp(TokioIo<TcpStream>),
    Unix(TokioIo<UnixStream>),
}

impl Read for SocketConnection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SocketConnection::Tcp(io) => Pin::new(io).poll_read(cx, buf),
            SocketConnection::Unix(io) => Pin::new(io).poll_read(cx, buf),
        }
    }
}

impl Write for SocketConnection {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            SocketConnection::Tcp(io) => Pin::new(io).poll_write(cx, buf),
            SocketConnection::Unix(io) => Pin::new(io).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SocketConnection::Tcp(io) => Pin::new(io).poll_flush(cx),
            SocketConnection::Unix(io) => Pin::new(io).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SocketConnection::Tcp(io) => Pin::new(io).poll_shutdown(cx),
            SocketConnection::Unix(io) => Pin::new(io).poll_shutdown(cx),
        }
    }
}

impl Connection for SocketConnection {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}

/// Connector that ignores the request URI and dials a fixed address.
#[derive(Debug, Clone)]
pub struct FixedConnector {
    address: Arc<SocketAddress>,
    timeout: Duration,
}

impl FixedConnector {
    pub fn new(address: SocketAddress, timeout: Duration) -> Self {
        Self {
            address: Arc::new(address),
            timeout,
        }
    }
}

impl Service<Uri> for FixedConnector {
    type Response = SocketConnection;
    type Error = ConnectError;
    type Future = Pin<Box<dyn Future<Output = Result<SocketConnection, ConnectError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _dst: Uri) -> Self::Future {
        let address = Arc::clone(&self.address);
        let timeout = self.timeout;
        Box::pin(async move { address.dial(timeout).await })
    }
}

/// Forwarding proxy for socket and `host:port` backends.
pub struct SocketProxy {
    address: SocketAddress,
    client: Client<FixedConnector, Body>,
    debug: bool,
}

impl SocketProxy {
    pub fn new(address: SocketAddress, connect_timeout: Duration, debug: bool) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .build(FixedConnector::new(address.clone(), connect_timeout));
        Self {
            address,
            client,
            debug,
        }
    }

    pub fn address(&self) -> &SocketAddress {
        &self.address
    }

    pub async fn serve(&self, req: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        let (mut parts, body) = req.into_parts();

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let uri = match Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(host.as_str())
            .path_and_query(path_and_query)
            .build()
        {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Unable to build backend URI");
                return response::bad_gateway();
            }
        };

        headers::prepare_forwarded(&mut parts.headers, client_addr);
        if !parts.headers.contains_key(header::HOST) {
            if let Ok(value) = host.parse::<HeaderValue>() {
                parts.headers.insert(header::HOST, value);
            }
        }

        if self.debug {
            tracing::info!(
                url = %uri,
                network = self.address.network(),
                address = %self.address,
                "Forwarding request"
            );
        }

        parts.uri = uri;
        parts.version = Version::HTTP_11;

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                headers::strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::warn!(address = %self.address, error = %e, "Unable to get response from socket backend");
                response::bad_gateway()
            }
        }
    }
}

impl fmt::Debug for SocketProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketProxy")
            .field("address", &self.address)
            .finish()
    }
}

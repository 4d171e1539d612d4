//! Backend resolution.
//!
//! Decides which handler serves a backend descriptor. Rules are tried in
//! order and the first match wins:
//!
//! 1. `@name` on linux: abstract unix socket
//! 2. absolute path ending in a separator: static files
//! 3. other absolute path: unix socket
//! 4. `http://` or `https://` URL: HTTP/HTTPS forwarding proxy
//! 5. anything else: `host:port` TCP forwarding proxy

use std::path::{Path, MAIN_SEPARATOR};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::Backend;
use crate::proxy::handler::Handler;
use crate::proxy::http_proxy::HttpProxy;
use crate::proxy::socket::{SocketAddress, SocketProxy};
use crate::proxy::static_files::StaticFiles;
use crate::proxy::transport::OutboundTransport;
use crate::routing::key::{self, RouteKind};

/// Shared state handlers are built from.
#[derive(Debug, Clone)]
pub struct Resolver {
    transport: Arc<OutboundTransport>,
    socket_connect_timeout: Duration,
    debug: bool,
}

impl Resolver {
    pub fn new(transport: Arc<OutboundTransport>, socket_connect_timeout: Duration, debug: bool) -> Self {
        Self {
            transport,
            socket_connect_timeout,
            debug,
        }
    }

    pub fn transport(&self) -> &Arc<OutboundTransport> {
        &self.transport
    }

    /// Build the handler for `backend` installed under the normalized `route_key`.
    pub fn resolve(&self, route_key: &str, backend: &Backend) -> Handler {
        let target = backend.target.as_str();

        if let Some(name) = target.strip_prefix('@') {
            if cfg!(target_os = "linux") {
                return self.socket(SocketAddress::abstract_name(name));
            }
        }

        if Path::new(target).is_absolute() {
            if target.ends_with(MAIN_SEPARATOR) || target.ends_with('/') {
                return Handler::Static(StaticFiles::new(target));
            }
            return self.socket(SocketAddress::Unix(target.into()));
        }

        if let Ok(url) = Url::parse(target) {
            if matches!(url.scheme(), "http" | "https") {
                let prefix = match key::kind(route_key) {
                    RouteKind::PathPrefix => route_key,
                    _ => "",
                };
                return Handler::Http(HttpProxy::new(
                    url,
                    prefix,
                    backend.set_cookie_path,
                    self.debug,
                    Arc::clone(&self.transport),
                ));
            }
        }

        self.socket(SocketAddress::Tcp(target.to_string()))
    }

    fn socket(&self, address: SocketAddress) -> Handler {
        Handler::Socket(SocketProxy::new(address, self.socket_connect_timeout, self.debug))
    }
}

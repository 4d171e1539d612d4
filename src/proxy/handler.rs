//! Request handlers installed in the route table.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::proxy::http_proxy::HttpProxy;
use crate::proxy::socket::SocketProxy;
use crate::proxy::static_files::StaticFiles;

/// The closed set of ways a resolved route can serve a request.
#[derive(Debug)]
pub enum Handler {
    Static(StaticFiles),
    Http(HttpProxy),
    Socket(SocketProxy),
}

impl Handler {
    pub async fn serve(&self, req: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        match self {
            Handler::Static(files) => files.serve(req).await,
            Handler::Http(proxy) => proxy.serve(req, client_addr).await,
            Handler::Socket(proxy) => proxy.serve(req, client_addr).await,
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Handler::Static(_) => "static",
            Handler::Http(_) => "http",
            Handler::Socket(_) => "socket",
        }
    }
}

/// A handler together with the route key and target it was built from.
#[derive(Debug)]
pub struct Route {
    pub key: String,
    pub target: String,
    pub handler: Handler,
}

impl Route {
    pub fn new(key: impl Into<String>, target: impl Into<String>, handler: Handler) -> Self {
        Self {
            key: key.into(),
            target: target.into(),
            handler,
        }
    }
}

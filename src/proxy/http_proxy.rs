//! Forwarding proxy for `http://` and `https://` targets.
//!
//! The outbound URI takes scheme and authority from the target, joins the
//! target path with the inbound path (minus the route prefix, if any) and
//! concatenates both query strings. The inbound `Host` header is kept.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, Uri, Version};
use url::{Position, Url};

use crate::http::response;
use crate::proxy::headers;
use crate::proxy::transport::OutboundTransport;

/// Join two path fragments with exactly one slash between them.
pub fn single_joining_slash(a: &str, b: &str) -> String {
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{}/{}", a, b),
        _ => format!("{}{}", a, b),
    }
}

/// Concatenate the target query and the request query.
pub fn join_query(target: &str, request: &str) -> String {
    if target.is_empty() || request.is_empty() {
        format!("{}{}", target, request)
    } else {
        format!("{}&{}", target, request)
    }
}

/// Reverse proxy to a single HTTP/HTTPS target.
#[derive(Debug)]
pub struct HttpProxy {
    target: Url,
    prefix: String,
    set_cookie_path: bool,
    debug: bool,
    transport: Arc<OutboundTransport>,
}

impl HttpProxy {
    /// `prefix` is stripped from inbound paths before joining; pass an empty
    /// string for host and wildcard routes.
    pub fn new(
        target: Url,
        prefix: impl Into<String>,
        set_cookie_path: bool,
        debug: bool,
        transport: Arc<OutboundTransport>,
    ) -> Self {
        Self {
            target,
            prefix: prefix.into(),
            set_cookie_path,
            debug,
            transport,
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Compute the backend URI for an inbound request URI.
    pub fn outbound_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path = inbound.path();
        let rest = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);

        let mut path_and_query = single_joining_slash(self.target.path(), rest);
        let query = join_query(self.target.query().unwrap_or(""), inbound.query().unwrap_or(""));
        if !query.is_empty() {
            path_and_query.push('?');
            path_and_query.push_str(&query);
        }

        Uri::builder()
            .scheme(self.target.scheme())
            .authority(&self.target[Position::BeforeHost..Position::AfterPort])
            .path_and_query(path_and_query)
            .build()
    }

    pub async fn serve(&self, req: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        let (mut parts, body) = req.into_parts();

        let uri = match self.outbound_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(backend = %self.target, error = %e, "Unable to build backend URI");
                return response::bad_gateway();
            }
        };

        if !parts.headers.contains_key(header::HOST) {
            if let Some(value) = parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
            {
                parts.headers.insert(header::HOST, value);
            }
        }
        headers::prepare_forwarded(&mut parts.headers, client_addr);
        if !parts.headers.contains_key(header::USER_AGENT) {
            parts.headers.insert(header::USER_AGENT, HeaderValue::from_static(""));
        }

        if self.debug {
            tracing::info!(url = %uri, "Forwarding request");
        }

        parts.uri = uri;
        parts.version = Version::HTTP_11;

        match self
            .transport
            .round_trip(Request::from_parts(parts, body), self.set_cookie_path)
            .await
        {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                headers::strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(_) => response::bad_gateway(),
        }
    }
}

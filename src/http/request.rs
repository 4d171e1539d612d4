//! Request inspection helpers.
//!
//! Extracts the routing-relevant parts of an inbound request: the host it
//! names and its raw request target.

use axum::http::{header, Request};

/// Lowercased host of the request, port included.
///
/// Uses the `Host` header, or the URI authority for HTTP/2 requests that
/// carry `:authority` instead. Empty if neither is present.
pub fn host<B>(req: &Request<B>) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// The request target as sent: path plus query.
pub fn request_target<B>(req: &Request<B>) -> &str {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
}

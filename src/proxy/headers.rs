//! Forwarding header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Append the client IP to X-Forwarded-For
//! - Mark forwarded requests as HTTPS
//!
//! # Design Decisions
//! - Headers listed in `Connection` are treated as hop-by-hop too
//! - X-Forwarded-Proto is always `https`; the gateway fronts TLS traffic

use std::net::SocketAddr;

use axum::http::header::{self, HeaderName};
use axum::http::{HeaderMap, HeaderValue};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Remove hop-by-hop headers, including those named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

/// Prepare inbound request headers for forwarding.
pub fn prepare_forwarded(headers: &mut HeaderMap, client_addr: Option<SocketAddr>) {
    strip_hop_by_hop(headers);

    if let Some(addr) = client_addr {
        let ip = addr.ip().to_string();
        let mut hops: Vec<&str> = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        hops.push(&ip);
        let forwarded_for = hops.join(", ");
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-internal"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-internal", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[test]
    fn test_forwarded_for_appends() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

        prepare_forwarded(&mut headers, Some("192.168.1.7:5000".parse().unwrap()));

        assert_eq!(headers[X_FORWARDED_FOR], "10.0.0.1, 192.168.1.7");
        assert_eq!(headers[X_FORWARDED_PROTO], "https");
    }

    #[test]
    fn test_forwarded_for_joins_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.2, 10.0.0.3"));

        prepare_forwarded(&mut headers, Some("192.168.1.7:5000".parse().unwrap()));

        assert_eq!(headers.get_all(X_FORWARDED_FOR).iter().count(), 1);
        assert_eq!(headers[X_FORWARDED_FOR], "10.0.0.1, 10.0.0.2, 10.0.0.3, 192.168.1.7");
    }

    #[test]
    fn test_forwarded_without_client_addr() {
        let mut headers = HeaderMap::new();
        prepare_forwarded(&mut headers, None);

        assert!(!headers.contains_key(X_FORWARDED_FOR));
        assert_eq!(headers[X_FORWARDED_PROTO], "https");
    }
}

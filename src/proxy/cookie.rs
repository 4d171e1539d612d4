//! `Set-Cookie` path rewriting.
//!
//! Backends mounted under a prefix often scope their cookies to that prefix.
//! Rewriting replaces the second attribute (assumed to be the path) with
//! `Path=/` and keeps the cookie pair and any remaining attributes.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};

/// Rewrite the path attribute of a single `Set-Cookie` value.
pub fn rewrite_cookie_path(value: &[u8]) -> Vec<u8> {
    let mut parts = value.split(|b| *b == b';');
    let mut out = parts.next().unwrap_or_default().to_vec();
    out.extend_from_slice(b"; Path=/");

    // Second attribute is the backend path; dropped.
    parts.next();
    for rest in parts {
        out.push(b';');
        out.extend_from_slice(rest);
    }
    out
}

/// Replace every `Set-Cookie` header with its path-rewritten form.
pub fn rewrite_set_cookie_paths(headers: &mut HeaderMap) {
    if !headers.contains_key(SET_COOKIE) {
        return;
    }

    let originals: Vec<HeaderValue> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    headers.remove(SET_COOKIE);

    for original in originals {
        let rewritten = HeaderValue::from_bytes(&rewrite_cookie_path(original.as_bytes()))
            .unwrap_or(original);
        headers.append(SET_COOKIE, rewritten);
    }
}

//! Gateway-generated responses.
//!
//! # Responsibilities
//! - Build the responses the gateway answers itself (404, 502, redirects)
//! - Hold the Strict-Transport-Security value
//!
//! # Design Decisions
//! - Error responses are plain text and always well-formed HTTP

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

/// Value of the Strict-Transport-Security header when HSTS is enabled.
pub const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains; preload";

fn plain(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    res
}

pub fn not_found() -> Response<Body> {
    plain(StatusCode::NOT_FOUND, "Not found")
}

pub fn bad_gateway() -> Response<Body> {
    plain(StatusCode::BAD_GATEWAY, "Bad Gateway")
}

pub fn bad_request() -> Response<Body> {
    plain(StatusCode::BAD_REQUEST, "Bad Request")
}

/// 301 to `location`. Falls back to 400 if `location` is not a valid header value.
pub fn moved_permanently(location: &str) -> Response<Body> {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut res = Response::new(Body::empty());
            *res.status_mut() = StatusCode::MOVED_PERMANENTLY;
            res.headers_mut().insert(header::LOCATION, value);
            res
        }
        Err(_) => bad_request(),
    }
}

//! Plain HTTP listener that redirects everything to HTTPS.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tokio::net::TcpListener;

use crate::http::{request, response};
use crate::lifecycle::Shutdown;

/// `https://<host><request target>`, or `None` when the request names no host.
pub fn https_location<B>(req: &Request<B>) -> Option<String> {
    let host = req
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))?;
    Some(format!("https://{}{}", host, request::request_target(req)))
}

async fn redirect(req: Request<Body>) -> Response<Body> {
    match https_location(&req) {
        Some(location) => response::moved_permanently(&location),
        None => response::bad_request(),
    }
}

pub fn app() -> Router {
    Router::new().fallback(redirect)
}

/// Serve the redirect app on `listener` until shutdown.
pub async fn run(listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP redirect listener starting");

    axum::serve(listener, app())
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    tracing::info!("HTTP redirect listener stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn test_https_location() {
        let req = Request::builder()
            .uri("/login?next=/home")
            .header(header::HOST, "Example.com")
            .body(())
            .unwrap();
        assert_eq!(
            https_location(&req).as_deref(),
            Some("https://Example.com/login?next=/home")
        );
    }

    #[tokio::test]
    async fn test_redirect_app() {
        let req = Request::builder()
            .uri("/a")
            .header(header::HOST, "a.test")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()[header::LOCATION], "https://a.test/a");
    }

    #[tokio::test]
    async fn test_missing_host_is_bad_request() {
        let req = Request::builder().uri("/a").body(Body::empty()).unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

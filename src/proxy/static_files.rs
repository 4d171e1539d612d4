//! Static file serving for directory targets.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Request, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Serves files below a root directory, `index.html` for directories.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    service: ServeDir,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let service = ServeDir::new(&root).append_index_html_on_directories(true);
        Self { root, service }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn serve(&self, req: Request<Body>) -> Response<Body> {
        let result: Result<_, Infallible> = self.service.clone().oneshot(req).await;
        match result {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        }
    }
}

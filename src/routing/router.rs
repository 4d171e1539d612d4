//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Run the three-tier lookup chain for a request
//! - Dispatch to the resolved handler or answer 404
//! - Add Strict-Transport-Security when enabled
//!
//! # Design Decisions
//! - Tiers are tried in fixed order: exact host, first path segment, `any`
//! - Each tier is one hash lookup against the live table
//! - HSTS is set on every response, including misses

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};

use crate::http::{request, response};
use crate::observability::metrics;
use crate::proxy::Route;
use crate::routing::key::{self, WILDCARD_KEY};
use crate::routing::table::RouteTable;

/// Which lookup tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Host,
    PathPrefix,
    Wildcard,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Host => "host",
            MatchTier::PathPrefix => "prefix",
            MatchTier::Wildcard => "any",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
    hsts: bool,
}

impl Router {
    pub fn new(table: Arc<RouteTable>, hsts: bool) -> Self {
        Self { table, hsts }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Resolve a lowercased host and raw request target to a route.
    pub fn resolve(&self, host: &str, request_target: &str) -> Option<(MatchTier, Arc<Route>)> {
        if let Some(route) = self.table.lookup(host) {
            return Some((MatchTier::Host, route));
        }
        if let Some(route) = key::prefix_key(request_target).and_then(|k| self.table.lookup(&k)) {
            return Some((MatchTier::PathPrefix, route));
        }
        self.table
            .lookup(WILDCARD_KEY)
            .map(|route| (MatchTier::Wildcard, route))
    }

    pub async fn dispatch(&self, req: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        let host = request::host(&req);
        let target = request::request_target(&req).to_string();

        let mut res = match self.resolve(&host, &target) {
            Some((tier, route)) => {
                metrics::record_dispatch(tier.as_str());
                tracing::debug!(host = %host, tier = tier.as_str(), route = %route.key, handler = route.handler.kind(), "Dispatching request");
                route.handler.serve(req, client_addr).await
            }
            None => {
                metrics::record_dispatch("none");
                tracing::debug!(host = %host, target = %target, "No route matched");
                response::not_found()
            }
        };

        if self.hsts {
            res.headers_mut().insert(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(response::HSTS_VALUE),
            );
        }
        res
    }
}

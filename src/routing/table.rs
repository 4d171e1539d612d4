//! Live route table.
//!
//! # Responsibilities
//! - Map normalized route keys to installed routes
//! - Atomic per-key replace, lock-light reads
//! - Report the hostnames currently served
//!
//! # Design Decisions
//! - DashMap shards the lock; no lock is held across a reload
//! - Entries are `Arc<Route>` so in-flight requests keep a replaced handler alive
//! - Nothing is removed implicitly

use std::sync::Arc;

use dashmap::DashMap;

use crate::proxy::Route;
use crate::routing::key::{self, RouteKind};

#[derive(Debug, Default)]
pub struct RouteTable {
    routes: DashMap<String, Arc<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `route` under its key, replacing any previous entry.
    pub fn upsert(&self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);
        self.routes.insert(route.key.clone(), Arc::clone(&route));
        route
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<Route>> {
        self.routes.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// True if `key` is installed with a route built from exactly `target`.
    pub fn exists(&self, key: &str, target: &str) -> bool {
        self.routes
            .get(key)
            .map(|entry| entry.target == target)
            .unwrap_or(false)
    }

    /// Explicit removal. Reloads never call this.
    pub fn remove(&self, key: &str) -> Option<Arc<Route>> {
        self.routes.remove(key).map(|(_, route)| route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Hostnames served: `default_hostname` first, then every host key, sorted.
    pub fn hostnames(&self, default_hostname: Option<&str>) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .routes
            .iter()
            .filter(|entry| key::kind(entry.key()) == RouteKind::Host)
            .map(|entry| entry.key().clone())
            .collect();
        hosts.sort();

        if let Some(default) = default_hostname.map(key::normalize) {
            hosts.retain(|host| *host != default);
            hosts.insert(0, default);
        }
        hosts
    }
}

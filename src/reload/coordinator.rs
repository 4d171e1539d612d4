//! Reconciles a parsed mapping into the live route table.
//!
//! # Responsibilities
//! - Reuse routes whose target is unchanged
//! - Reject keys with a path separator
//! - Resolve and install new or changed routes, one key at a time
//!
//! # Design Decisions
//! - An empty mapping aborts the pass; the live table is never emptied
//! - Keys absent from the new mapping stay installed

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{Backend, Mapping, MappingError};
use crate::proxy::{Resolver, Route};
use crate::routing::key;
use crate::routing::RouteTable;

/// Error type for a reload pass.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("mapping is empty, keeping current routes")]
    EmptyMapping,

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Outcome of one reload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Entries in the mapping.
    pub loaded: usize,
    /// Entries whose installed route was kept as-is.
    pub reused: usize,
    /// Entries resolved and installed.
    pub installed: usize,
    /// Entries rejected for an invalid or duplicate key, or an empty target.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ReloadCoordinator {
    table: Arc<RouteTable>,
    resolver: Resolver,
}

impl ReloadCoordinator {
    pub fn new(table: Arc<RouteTable>, resolver: Resolver) -> Self {
        Self { table, resolver }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Apply `mapping` to the live table.
    pub fn apply(&self, mapping: &Mapping) -> Result<ReloadReport, ReloadError> {
        if mapping.is_empty() {
            return Err(ReloadError::EmptyMapping);
        }

        let mut report = ReloadReport {
            loaded: mapping.len(),
            ..ReloadReport::default()
        };

        let mut entries: Vec<(&String, &Backend)> = mapping.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        let mut seen = HashSet::with_capacity(entries.len());

        for (raw_key, backend) in entries {
            let route_key = key::normalize(raw_key);

            // Keys differing only by case collapse to one route; the first in key order wins.
            if !seen.insert(route_key.clone()) {
                tracing::warn!(key = %raw_key, route = %route_key, "Duplicate hostname, skipping");
                report.skipped += 1;
                continue;
            }

            if self.table.exists(&route_key, &backend.target) {
                report.reused += 1;
                continue;
            }

            if key::has_path_separator(&route_key) {
                tracing::warn!(key = %raw_key, "Invalid hostname");
                report.skipped += 1;
                continue;
            }

            if backend.target.is_empty() {
                tracing::warn!(key = %raw_key, "Empty target, skipping");
                report.skipped += 1;
                continue;
            }

            let handler = self.resolver.resolve(&route_key, backend);
            tracing::debug!(key = %route_key, target = %backend.target, handler = handler.kind(), "Installing route");
            self.table
                .upsert(Route::new(route_key, backend.target.as_str(), handler));
            report.installed += 1;
        }

        tracing::info!(
            loaded = report.loaded,
            reused = report.reused,
            installed = report.installed,
            skipped = report.skipped,
            "{} mappings have been loaded",
            report.loaded
        );
        Ok(report)
    }
}

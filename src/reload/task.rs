//! Background reload task.
//!
//! Triggers (file changes, SIGHUP) queue on an unbounded channel and are
//! processed one at a time; each pass re-reads the mapping file and applies
//! a full diff.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::config::{read_mapping, ReloadTrigger};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::reload::coordinator::{ReloadCoordinator, ReloadError, ReloadReport};

/// Read the mapping at `path` and apply it.
///
/// Logs the served hostnames after a successful pass.
pub async fn reload_from_file(
    coordinator: &ReloadCoordinator,
    path: &Path,
    default_hostname: Option<&str>,
) -> Result<ReloadReport, ReloadError> {
    let owned = path.to_path_buf();
    let mapping = match tokio::task::spawn_blocking(move || read_mapping(&owned)).await {
        Ok(result) => result?,
        Err(e) => return Err(ReloadError::Mapping(std::io::Error::other(e).into())),
    };

    match coordinator.apply(&mapping) {
        Ok(report) => {
            let table = coordinator.table();
            metrics::record_reload("ok", table.len());
            tracing::info!(hostnames = ?table.hostnames(default_hostname), "Serving hostnames");
            Ok(report)
        }
        Err(e) => {
            metrics::record_reload("error", coordinator.table().len());
            Err(e)
        }
    }
}

pub struct ReloadTask {
    coordinator: ReloadCoordinator,
    mapping_path: PathBuf,
    default_hostname: Option<String>,
    triggers: mpsc::UnboundedReceiver<ReloadTrigger>,
}

impl ReloadTask {
    pub fn new(
        coordinator: ReloadCoordinator,
        mapping_path: PathBuf,
        default_hostname: Option<String>,
        triggers: mpsc::UnboundedReceiver<ReloadTrigger>,
    ) -> Self {
        Self {
            coordinator,
            mapping_path,
            default_hostname,
            triggers,
        }
    }

    /// Process triggers until shutdown or until every sender is dropped.
    pub async fn run(mut self, shutdown: Shutdown) {
        loop {
            let trigger = tokio::select! {
                trigger = self.triggers.recv() => match trigger {
                    Some(trigger) => trigger,
                    None => break,
                },
                _ = shutdown.wait() => break,
            };

            tracing::debug!(trigger = ?trigger, "Reload requested");
            if let Err(e) = reload_from_file(
                &self.coordinator,
                &self.mapping_path,
                self.default_hostname.as_deref(),
            )
            .await
            {
                tracing::error!(path = %self.mapping_path.display(), error = %e, "Reload aborted");
            }
        }
        tracing::debug!("Reload task stopped");
    }
}

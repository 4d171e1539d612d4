//! Mapping file watcher for hot reload.
//!
//! The watcher only produces triggers; reading and applying the mapping is
//! done by the reload task so that reloads stay serial.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Why a reload was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// The mapping file was written, created or replaced.
    FileChanged(PathBuf),
    /// A manual trigger (SIGHUP).
    Signal,
}

/// A watcher that monitors the mapping file for changes.
pub struct MappingWatcher {
    path: PathBuf,
    trigger_tx: mpsc::UnboundedSender<ReloadTrigger>,
}

impl MappingWatcher {
    pub fn new(path: &Path, trigger_tx: mpsc::UnboundedSender<ReloadTrigger>) -> Self {
        Self {
            path: path.to_path_buf(),
            trigger_tx,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The parent directory is watched rather than the file itself, so that
    /// editors replacing the file by rename keep triggering reloads.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.trigger_tx;
        let path = self.path.clone();
        let file_name = self.path.file_name().map(|name| name.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let touches_mapping = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_mapping {
                        tracing::info!(path = %path.display(), "Mapping updated, reloading");
                        let _ = tx.send(ReloadTrigger::FileChanged(path.clone()));
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Mapping watcher started");
        Ok(watcher)
    }
}

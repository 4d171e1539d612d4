//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP queues a mapping reload, not shutdown
//! - The first SIGTERM/SIGINT triggers shutdown and ends the loop

use tokio::sync::mpsc;

use crate::config::ReloadTrigger;
use crate::lifecycle::Shutdown;

/// Wait for signals until shutdown, forwarding SIGHUP as a reload trigger.
#[cfg(unix)]
pub async fn listen(shutdown: Shutdown, reload: mpsc::UnboundedSender<ReloadTrigger>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
                break;
            }
            _ = sighup.recv() => {
                tracing::info!("Received SIGHUP, reloading mapping");
                if reload.send(ReloadTrigger::Signal).is_err() {
                    tracing::warn!("Reload task is gone, ignoring SIGHUP");
                }
            }
            _ = shutdown.wait() => return Ok(()),
        }
    }

    shutdown.trigger();
    Ok(())
}

#[cfg(not(unix))]
pub async fn listen(shutdown: Shutdown, _reload: mpsc::UnboundedSender<ReloadTrigger>) -> std::io::Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Received Ctrl+C, shutting down");
            shutdown.trigger();
        }
        _ = shutdown.wait() => {}
    }
    Ok(())
}

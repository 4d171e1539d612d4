//! Hot reload subsystem.
//!
//! # Data Flow
//! ```text
//! Trigger (config/watcher.rs file event, SIGHUP)
//!     → task.rs (serial queue, re-read mapping)
//!     → coordinator.rs (diff against live table)
//!     → proxy::Resolver (new or changed keys only)
//!     → routing::RouteTable upsert
//! ```
//!
//! # Design Decisions
//! - One reload at a time; requests keep flowing during a reload
//! - Rapid triggers are not coalesced, each runs a full pass

pub mod coordinator;
pub mod task;

pub use coordinator::{ReloadCoordinator, ReloadError, ReloadReport};
pub use task::{reload_from_file, ReloadTask};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host, request target)
//!     → router.rs (host → first path segment → `any`)
//!     → table.rs (live key → Route map)
//!     → Return: matched Route or 404
//!
//! Reload:
//!     Mapping keys → key.rs (normalize, validate)
//!     → table.rs upsert, one key at a time
//! ```
//!
//! # Design Decisions
//! - Hostname keys are lowercased on store and on lookup
//! - Per-key atomic swap, readers never block on a reload
//! - Routing is additive: reloads never drop keys

pub mod key;
pub mod router;
pub mod table;

pub use router::{MatchTier, Router};
pub use table::RouteTable;

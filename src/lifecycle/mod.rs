//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Queue a mapping reload
//! ```
//!
//! # Design Decisions
//! - Shutdown has a grace period: forced exit after the deadline
//! - The initial mapping load must succeed before listeners start

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

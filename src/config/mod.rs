//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional) + CLI flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (immutable for the process lifetime)
//!
//! mapping.yml
//!     → mapping.rs (parse, legacy fallback)
//!     → reload coordinator (diff & install into the route table)
//!
//! On change:
//!     watcher.rs detects the write
//!     → ReloadTrigger sent to the reload task
//! ```
//!
//! # Design Decisions
//! - Gateway settings need a restart; only the mapping is hot-reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod mapping;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use mapping::{parse_mapping, read_mapping, Backend, Mapping, MappingError};
pub use schema::{GatewayConfig, ListenerConfig, RoutingConfig, TlsConfig, TransportConfig};
pub use watcher::{MappingWatcher, ReloadTrigger};

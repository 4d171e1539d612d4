//! Backend dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Backend descriptor (from mapping)
//!     → resolver.rs (pick handler variant)
//!     → handler.rs (Static | Http | Socket)
//!
//! Request to a resolved handler:
//!     Static → static_files.rs (ServeDir)
//!     Http   → http_proxy.rs (rewrite URI) → transport.rs (shared pool) → backend
//!     Socket → socket.rs (fixed-address dial) → backend
//!     headers.rs strips hop-by-hop headers both ways, cookie.rs rewrites Set-Cookie paths
//! ```
//!
//! # Design Decisions
//! - Handlers are a closed enum, no trait objects
//! - One pooled transport shared by every HTTP/HTTPS handler
//! - Backend failures become 502 responses, never dropped connections

pub mod cookie;
pub mod handler;
pub mod headers;
pub mod http_proxy;
pub mod resolver;
pub mod socket;
pub mod static_files;
pub mod transport;

pub use handler::{Handler, Route};
pub use resolver::Resolver;
pub use transport::{OutboundTransport, TransportError};

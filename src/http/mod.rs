//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum app, request ID, trace span)
//!     → routing::Router (three-tier lookup, HSTS)
//!     → proxy::Handler (static, HTTP proxy, socket proxy)
//!     → response.rs (gateway-generated 404/502)
//!     → Send to client
//!
//! Optional plain listener:
//!     → redirect.rs (301 to https)
//! ```

pub mod redirect;
pub mod request;
pub mod response;
pub mod server;

pub use server::GatewayServer;

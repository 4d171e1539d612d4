//! Host-based reverse-proxy gateway library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod reload;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use reload::ReloadCoordinator;
pub use routing::{RouteTable, Router};

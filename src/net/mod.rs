//! Network layer subsystem.
//!
//! Certificates are provisioned externally; this layer only loads the PEM
//! files the listener is configured with.

pub mod tls;

pub use tls::{load_tls_config, TlsError};

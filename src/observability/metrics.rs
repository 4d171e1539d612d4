//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): dispatched requests by lookup tier
//!   (`host`, `prefix`, `any`, `none`)
//! - `gateway_pool_resets_total` (counter): forced closures of idle pooled connections
//! - `gateway_reloads_total` (counter): reload passes by outcome (`ok`, `error`)
//! - `gateway_routes` (gauge): installed route keys
//!
//! Recording is a no-op until a recorder is installed, so the helpers are
//! safe to call from tests and with metrics disabled.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe();
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn describe() {
    ::metrics::describe_counter!("gateway_requests_total", "Requests dispatched, by lookup tier");
    ::metrics::describe_counter!(
        "gateway_pool_resets_total",
        "Forced closures of idle pooled backend connections"
    );
    ::metrics::describe_counter!("gateway_reloads_total", "Mapping reload passes, by outcome");
    ::metrics::describe_gauge!("gateway_routes", "Installed route keys");
}

pub fn record_dispatch(tier: &'static str) {
    ::metrics::counter!("gateway_requests_total", "tier" => tier).increment(1);
}

pub fn record_pool_reset() {
    ::metrics::counter!("gateway_pool_resets_total").increment(1);
}

pub fn record_reload(outcome: &'static str, routes: usize) {
    ::metrics::counter!("gateway_reloads_total", "outcome" => outcome).increment(1);
    ::metrics::gauge!("gateway_routes").set(routes as f64);
}

//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The metrics registry is created here and injected into the server

use crate::config::Config;
use crate::http::HttpServer;
use crate::lifecycle::LifecycleError;
use crate::observability::MetricsRegistry;

/// Build the server for a validated configuration.
pub fn prepare(config: &Config) -> Result<HttpServer, LifecycleError> {
    tracing::info!(
        listen_addr = %config.listen_addr,
        upstream_base_url = %config.upstream_base_url,
        tool_dir = %config.tool_dir,
        telemetry_path = %config.telemetry_path,
        "Configuration loaded"
    );

    let registry = MetricsRegistry::new()?;
    Ok(HttpServer::new(config.listen_addr.clone(), &registry))
}

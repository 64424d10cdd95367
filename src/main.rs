//! Agent proxy service (v0.1)
//!
//! # Architecture Overview
//!
//! ```text
//!   env ──▶ config ──▶ lifecycle::startup ──▶ HttpServer (background task)
//!                                                 │
//!   client ──▶ net listener ──▶ hyper conn ──▶ router ──▶ metrics middleware ──▶ /healthz
//!                                                      └─────────────────────▶ /metrics
//!
//!   SIGINT/SIGTERM ──▶ lifecycle ──▶ Shutdown::trigger ──▶ drain (≤ 10s) ──▶ exit
//! ```

use agent_prxy::config::Config;
use agent_prxy::lifecycle;
use agent_prxy::observability::logging;

#[tokio::main]
async fn main() {
    logging::init();

    tracing::info!("agent-prxy v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match Config::from_env() {
        Ok(config) => lifecycle::run(config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

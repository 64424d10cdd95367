//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! starting:      config loaded by the caller → startup.rs builds the server
//! serving:       server task spawned; wait for a signal or for the task to end
//! shutting-down: signal → Shutdown::trigger → drain bounded by SHUTDOWN_TIMEOUT
//!                task ended on its own → reported as-is, no grace period
//! stopped:       Ok(())
//! ```
//!
//! Any error ends the process non-zero; nothing is retried here.

pub mod shutdown;
pub mod signals;
pub mod startup;

use std::future::Future;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

use crate::config::{Config, ConfigError};
use crate::http::server::ServerError;

pub use shutdown::{DrainTimedOut, Shutdown, SHUTDOWN_TIMEOUT};
pub use signals::shutdown_signal;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("metrics setup error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("http server error: {0}")]
    Server(#[from] ServerError),

    #[error("http server task failed: {0}")]
    ServerTask(#[from] JoinError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    #[error("graceful shutdown error: connections still open after {0:?}")]
    ShutdownTimeout(Duration),
}

/// Serve until SIGINT or SIGTERM, then shut down gracefully.
pub async fn run(config: Config) -> Result<(), LifecycleError> {
    run_until(config, shutdown_signal()).await
}

/// Serve until `signal` resolves, then shut down gracefully.
///
/// If the server stops on its own first, its result is returned at once.
pub async fn run_until<F>(config: Config, signal: F) -> Result<(), LifecycleError>
where
    F: Future<Output = io::Result<&'static str>>,
{
    let server = startup::prepare(&config)?;

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(shutdown.subscribe()));

    tokio::select! {
        received = signal => {
            let name = received.map_err(LifecycleError::Signal)?;
            tracing::info!(signal = name, "Received signal, shutting down");
        }
        result = &mut server_task => {
            result??;
            tracing::info!("HTTP server closed");
            return Ok(());
        }
    }

    let joined = shutdown
        .drain(&mut server_task, SHUTDOWN_TIMEOUT)
        .await
        .map_err(|_| LifecycleError::ShutdownTimeout(SHUTDOWN_TIMEOUT))?;
    joined??;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn config(listen_addr: &str) -> Config {
        Config {
            listen_addr: listen_addr.to_string(),
            upstream_base_url: "https://api.openai.com".into(),
            upstream_api_key: "sk-test".into(),
            tool_dir: "./tools.d".into(),
            telemetry_path: "./runs.jsonl".into(),
        }
    }

    #[tokio::test]
    async fn signal_triggers_clean_shutdown() {
        let start = Instant::now();
        let signal = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok("SIGTERM")
        };

        run_until(config("127.0.0.1:0"), signal).await.unwrap();

        assert!(start.elapsed() < SHUTDOWN_TIMEOUT);
    }

    #[tokio::test]
    async fn bind_failure_is_fatal_without_waiting_for_signal() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_until(config(&addr), std::future::pending()),
        )
        .await
        .expect("bind failure should end the run");

        assert!(matches!(result, Err(LifecycleError::Server(_))));
    }

    #[tokio::test]
    async fn signal_handler_failure_is_reported() {
        let signal = async { Err(io::Error::new(io::ErrorKind::Other, "no signals")) };

        let result = run_until(config("127.0.0.1:0"), signal).await;

        assert!(matches!(result, Err(LifecycleError::Signal(_))));
    }
}

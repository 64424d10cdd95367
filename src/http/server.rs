//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the fixed route set
//! - Wire up middleware (request ID, tracing, panics, timeouts)
//! - Serve HTTP/1.1 and HTTP/2 connections off the listener
//! - Drain connections on shutdown

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::http::healthz::{healthz, HEALTHZ_ROUTE};
use crate::http::middleware::instrument;
use crate::http::request::{request_id_header, UuidRequestId};
use crate::net::{self, Activity, ActivityIo, ConnectionGuard, ConnectionTracker, ListenerError};
use crate::observability::{self, MetricsRegistry};

pub const METRICS_ROUTE: &str = "/metrics";

/// Time allowed to receive the request body.
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);
/// Time allowed to receive the request head.
pub const READ_HEADER_TIMEOUT: Duration = Duration::from_secs(5);
/// Time allowed to produce the response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
/// Time a connection may sit without socket activity.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// HTTP server exposing the health and metrics endpoints.
pub struct HttpServer {
    router: Router,
    listen_addr: String,
}

impl HttpServer {
    /// Create a server for `listen_addr`, instrumented against `registry`.
    pub fn new(listen_addr: impl Into<String>, registry: &MetricsRegistry) -> Self {
        registry.register();

        Self {
            router: Self::build_router(registry),
            listen_addr: listen_addr.into(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(registry: &MetricsRegistry) -> Router {
        Router::new()
            .route(HEALTHZ_ROUTE, instrument(HEALTHZ_ROUTE, registry, any(healthz)))
            .route(METRICS_ROUTE, get(render_metrics))
            .with_state(registry.clone())
            .layer(RequestBodyTimeoutLayer::new(READ_TIMEOUT))
            .layer(write_timeout_layer())
            .layer(CatchPanicLayer::new())
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TraceLayer::new_for_http().make_span_with(observability::tracing::make_request_span))
            .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let listener = net::bind(&self.listen_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from `listener` until `shutdown` fires, then drain.
    ///
    /// Returns once every connection accepted before shutdown has closed.
    /// Connection tasks are owned by this future: dropping or aborting it
    /// closes them too.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server listening");
        }

        let mut builder = Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(READ_HEADER_TIMEOUT);

        let tracker = ConnectionTracker::new();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        let guard = tracker.track();
                        tracing::debug!(
                            peer_addr = %peer_addr,
                            connection_id = %guard.id(),
                            "Connection accepted"
                        );
                        connections.spawn(serve_connection(
                            stream,
                            builder.clone(),
                            self.router.clone(),
                            tracker.drain_receiver(),
                            guard,
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    log_connection_exit(joined);
                }
                _ = shutdown.recv() => break,
            }
        }

        drop(listener);
        tracing::info!(
            active_connections = tracker.active_count(),
            "HTTP server draining connections"
        );
        tracker.begin_drain();
        tracker.wait_for_drain().await;
        while let Some(joined) = connections.join_next().await {
            log_connection_exit(joined);
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Drive one connection to completion, honouring drain and idle timeout.
async fn serve_connection(
    stream: TcpStream,
    builder: Builder<TokioExecutor>,
    router: Router,
    mut drain: watch::Receiver<bool>,
    guard: ConnectionGuard,
) {
    let (io, activity) = ActivityIo::new(stream);
    let conn = builder
        .serve_connection(TokioIo::new(io), TowerToHyperService::new(router))
        .into_owned();
    tokio::pin!(conn);

    let mut draining = false;
    if *drain.borrow_and_update() {
        conn.as_mut().graceful_shutdown();
        draining = true;
    }

    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(connection_id = %guard.id(), error = %e, "Connection error");
                }
                break;
            }
            _ = drain.changed(), if !draining => {
                conn.as_mut().graceful_shutdown();
                draining = true;
            }
            _ = tokio::time::sleep(idle_remaining(&activity)) => {
                if activity.idle_for() >= IDLE_TIMEOUT {
                    tracing::debug!(connection_id = %guard.id(), "Idle timeout, closing connection");
                    break;
                }
            }
        }
    }
}

fn log_connection_exit(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "Connection task panicked");
        }
    }
}

/// Bounds handler completion; an overrun answers 408.
fn write_timeout_layer() -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, WRITE_TIMEOUT)
}

fn idle_remaining(activity: &Activity) -> Duration {
    IDLE_TIMEOUT.saturating_sub(activity.idle_for())
}

async fn render_metrics(State(registry): State<MetricsRegistry>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], registry.render())
}

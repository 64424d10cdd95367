//! Agent proxy service skeleton.
//!
//! Serves a liveness endpoint and a Prometheus scrape endpoint, and shuts
//! down gracefully on SIGINT/SIGTERM.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::Config;
pub use http::HttpServer;
pub use lifecycle::{LifecycleError, Shutdown};
pub use observability::MetricsRegistry;

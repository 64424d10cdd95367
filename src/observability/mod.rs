//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (per-request spans with request IDs)
//!
//! Consumers:
//!     → stdout log stream
//!     → GET /metrics (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::metrics::MetricsRegistry;

//! Request middleware applied per route.

pub mod metrics;

pub use self::metrics::{instrument, track_metrics, RouteMetrics};

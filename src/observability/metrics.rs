//! Metrics collection and exposition.
//!
//! # Metrics
//! - `agent_prxy_requests_total` (counter): requests by method, route, status code
//! - `agent_prxy_request_duration_seconds` (histogram): latency by method, route
//! - `agent_prxy_in_flight_requests` (gauge): requests currently being served, by route
//!
//! # Design Decisions
//! - The registry is injected into the server, never installed as the global recorder
//! - Descriptions are applied once per registry, however many servers share it
//! - Route labels are registered path patterns, keeping label cardinality bounded

use std::sync::{Arc, Once};
use std::time::Duration;

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Label, Level, Metadata, Recorder, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const REQUESTS_TOTAL: &str = "agent_prxy_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "agent_prxy_request_duration_seconds";
pub const IN_FLIGHT_REQUESTS: &str = "agent_prxy_in_flight_requests";

/// Prometheus client default histogram buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Process-scoped metrics registry backed by a Prometheus recorder.
#[derive(Clone)]
pub struct MetricsRegistry {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    described: Arc<Once>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION_SECONDS.to_string()), &DEFAULT_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        Ok(Self {
            recorder: Arc::new(recorder),
            handle,
            described: Arc::new(Once::new()),
        })
    }

    /// Describe the request metrics. Safe to call any number of times.
    pub fn register(&self) {
        self.described.call_once(|| {
            self.recorder.describe_counter(
                KeyName::from(REQUESTS_TOTAL),
                None,
                "Total number of HTTP requests.".into(),
            );
            self.recorder.describe_histogram(
                KeyName::from(REQUEST_DURATION_SECONDS),
                Some(Unit::Seconds),
                "HTTP request duration in seconds.".into(),
            );
            self.recorder.describe_gauge(
                KeyName::from(IN_FLIGHT_REQUESTS),
                None,
                "In-flight HTTP requests.".into(),
            );
            tracing::debug!("Request metrics registered");
        });
    }

    /// Render the current snapshot in the Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Mark a request on `route` as in flight until the guard is dropped.
    pub fn track_in_flight(&self, route: &'static str) -> InFlightGuard {
        let gauge = self.gauge(IN_FLIGHT_REQUESTS, vec![Label::new("route", route)]);
        gauge.increment(1.0);
        InFlightGuard { gauge }
    }

    /// Record a completed request.
    pub fn record_request(&self, method: &str, route: &'static str, status: u16, elapsed: Duration) {
        let method = method.to_string();

        self.counter(
            REQUESTS_TOTAL,
            vec![
                Label::new("method", method.clone()),
                Label::new("route", route),
                Label::new("code", status.to_string()),
            ],
        )
        .increment(1);

        self.histogram(
            REQUEST_DURATION_SECONDS,
            vec![Label::new("method", method), Label::new("route", route)],
        )
        .record(elapsed.as_secs_f64());
    }

    fn counter(&self, name: &'static str, labels: Vec<Label>) -> Counter {
        self.recorder.register_counter(&Key::from_parts(name, labels), &metadata())
    }

    fn gauge(&self, name: &'static str, labels: Vec<Label>) -> Gauge {
        self.recorder.register_gauge(&Key::from_parts(name, labels), &metadata())
    }

    fn histogram(&self, name: &'static str, labels: Vec<Label>) -> Histogram {
        self.recorder.register_histogram(&Key::from_parts(name, labels), &metadata())
    }
}

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

/// Scoped in-flight marker. Decrements the gauge on drop, so panics and
/// cancelled requests are released too.
pub struct InFlightGuard {
    gauge: Gauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}

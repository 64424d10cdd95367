//! Request instrumentation middleware.
//!
//! Wraps a route to record the in-flight gauge, the request counter and the
//! latency histogram. The status recorded is the one on the response the
//! handler produced: a bare body means 200, an explicit status wins.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::observability::MetricsRegistry;

/// Middleware state: the registry plus the fixed route label.
#[derive(Clone)]
pub struct RouteMetrics {
    pub registry: MetricsRegistry,
    pub route: &'static str,
}

pub async fn track_metrics(
    State(metrics): State<RouteMetrics>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let start = Instant::now();
    let _in_flight = metrics.registry.track_in_flight(metrics.route);

    let response = next.run(request).await;

    metrics.registry.record_request(
        method.as_str(),
        metrics.route,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}

/// Instrument `handler`, labelling its metrics with `route`.
///
/// `route` must be the registered path pattern, never a raw request path.
pub fn instrument<S>(
    route: &'static str,
    registry: &MetricsRegistry,
    handler: MethodRouter<S>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = RouteMetrics {
        registry: registry.clone(),
        route,
    };
    handler.layer(middleware::from_fn_with_state(state, track_metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::testing::sample;
    use crate::observability::metrics::{IN_FLIGHT_REQUESTS, REQUESTS_TOTAL};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    const ROUTE: &str = "/healthz";

    async fn send(app: Router, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap()
    }

    fn count(registry: &MetricsRegistry, code: &str) -> Option<f64> {
        sample(
            &registry.render(),
            REQUESTS_TOTAL,
            &[("method", "GET"), ("route", ROUTE), ("code", code)],
        )
    }

    #[tokio::test]
    async fn implicit_ok_is_recorded_once() {
        let registry = MetricsRegistry::new().unwrap();
        let app = Router::new().route(ROUTE, instrument(ROUTE, &registry, get(|| async { "ok" })));

        let response = send(app, ROUTE).await;
        assert_eq!(response.status(), StatusCode::OK);

        let rendered = registry.render();
        assert_eq!(count(&registry, "200"), Some(1.0));
        assert_eq!(
            sample(
                &rendered,
                "agent_prxy_request_duration_seconds_count",
                &[("method", "GET"), ("route", ROUTE)]
            ),
            Some(1.0)
        );
        assert_eq!(
            sample(&rendered, IN_FLIGHT_REQUESTS, &[("route", ROUTE)]),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn explicit_status_wins() {
        let registry = MetricsRegistry::new().unwrap();
        let app = Router::new().route(
            ROUTE,
            instrument(ROUTE, &registry, get(|| async { (StatusCode::CREATED, "x") })),
        );

        send(app, ROUTE).await;

        assert_eq!(count(&registry, "201"), Some(1.0));
        assert_eq!(count(&registry, "200"), None);
    }

    #[tokio::test]
    async fn route_label_is_the_pattern_not_the_path() {
        let registry = MetricsRegistry::new().unwrap();
        let app = Router::new().route(
            "/items/{id}",
            instrument("/items/{id}", &registry, get(|| async { "item" })),
        );

        send(app.clone(), "/items/1").await;
        send(app, "/items/2").await;

        let rendered = registry.render();
        assert_eq!(
            sample(&rendered, REQUESTS_TOTAL, &[("route", "/items/{id}")]),
            Some(2.0)
        );
        assert!(!rendered.contains("/items/1"));
    }

    async fn failing_handler() -> &'static str {
        panic!("handler failure")
    }

    #[tokio::test]
    async fn panicking_handler_releases_in_flight() {
        let registry = MetricsRegistry::new().unwrap();
        let app = Router::new()
            .route(
                ROUTE,
                instrument(ROUTE, &registry, get(failing_handler)),
            )
            .layer(CatchPanicLayer::new());

        let response = send(app, ROUTE).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            sample(&registry.render(), IN_FLIGHT_REQUESTS, &[("route", ROUTE)]),
            Some(0.0)
        );
        assert_eq!(count(&registry, "200"), None);
    }
}

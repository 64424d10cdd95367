//! End-to-end tests over a real socket.

use std::time::Duration;

use reqwest::{header, Method, StatusCode};

mod common;

/// Sorted response headers, minus the ones that differ on every response.
fn stable_headers(headers: &header::HeaderMap) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = headers
        .iter()
        .filter(|(name, _)| *name != header::DATE && name.as_str() != "x-request-id")
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
        .collect();
    pairs.sort();
    pairs
}

#[tokio::test]
async fn healthz_over_the_wire() {
    let server = common::start_server().await;
    let client = common::client();

    let res = client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.contains("text/plain"));
    assert!(res.headers().contains_key("x-request-id"));
    let get_headers = stable_headers(res.headers());
    assert_eq!(res.text().await.unwrap(), "ok\n");

    let res = client.head(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(stable_headers(res.headers()), get_headers);
    assert!(get_headers.contains(&("content-length".to_string(), "3".to_string())));
    assert_eq!(res.text().await.unwrap(), "");

    let res = client
        .request(Method::DELETE, server.url("/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers().get(header::ALLOW).unwrap(), "GET, HEAD");
    assert!(!res.text().await.unwrap().is_empty());

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn metrics_scrape_reflects_traffic() {
    let server = common::start_server().await;
    let client = common::client();

    client.get(server.url("/healthz")).send().await.unwrap();
    client.post(server.url("/healthz")).send().await.unwrap();

    let body = client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(
        common::sample(
            &body,
            "agent_prxy_requests_total",
            &[("method", "GET"), ("route", "/healthz"), ("code", "200")]
        ),
        Some(1.0)
    );
    assert_eq!(
        common::sample(
            &body,
            "agent_prxy_requests_total",
            &[("method", "POST"), ("route", "/healthz"), ("code", "405")]
        ),
        Some(1.0)
    );
    assert_eq!(
        common::sample(&body, "agent_prxy_in_flight_requests", &[("route", "/healthz")]),
        Some(0.0)
    );

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_with_no_traffic_is_prompt() {
    let server = common::start_server().await;

    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(10), server.task)
        .await
        .expect("server should stop within the shutdown deadline")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn idle_keep_alive_connection_does_not_block_shutdown() {
    let server = common::start_server().await;
    let client = common::client();

    // Leaves a pooled keep-alive connection open on the server.
    let res = client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.text().await.unwrap();

    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(10), server.task)
        .await
        .expect("idle connections should close on drain")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn listener_closes_after_shutdown() {
    let server = common::start_server().await;
    let addr = server.addr;

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn aborting_the_server_closes_open_connections() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let server = common::start_server().await;

    // A request head that never completes keeps the connection busy.
    let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET /healthz HTTP/1.1\r\nHost: test\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.task.abort();
    assert!(server.task.await.unwrap_err().is_cancelled());

    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
        .await
        .expect("connection should close with the server task");
    assert!(matches!(read, Ok(0) | Err(_)));
}

//! Shared utilities for integration tests.

use std::net::SocketAddr;

use agent_prxy::http::ServerError;
use agent_prxy::{HttpServer, MetricsRegistry, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: MetricsRegistry,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a server against a fresh registry.
pub async fn start_server() -> TestServer {
    let registry = MetricsRegistry::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(addr.to_string(), &registry);
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.serve(listener, shutdown.subscribe()));

    TestServer {
        addr,
        registry,
        shutdown,
        task,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Value of the first sample named `name` carrying every label in `labels`.
#[allow(dead_code)]
pub fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (metric, label_set) = series.split_once('{').unwrap_or((series, ""));
            if metric != name {
                return None;
            }
            labels
                .iter()
                .all(|(k, v)| label_set.contains(&format!("{}=\"{}\"", k, v)))
                .then(|| value.parse().ok())
                .flatten()
        })
}

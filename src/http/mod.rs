//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, Axum router, timeouts)
//!     → request.rs (request ID)
//!     → middleware/ (per-route instrumentation)
//!     → healthz.rs | metrics scrape
//! ```

pub mod healthz;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};

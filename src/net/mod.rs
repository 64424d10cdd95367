//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured listen address
//!     → listener.rs (wildcard candidates, bind)
//!     → accept loop in http/server.rs
//!     → connection.rs (tracking, idle stamping, drain signal)
//!     → hand off to hyper
//! ```
//!
//! # Design Decisions
//! - Each connection is tracked so shutdown can wait for it
//! - Idle connections are closed after a fixed period without socket activity

pub mod connection;
pub mod listener;

pub use connection::{Activity, ActivityIo, ConnectionGuard, ConnectionTracker};
pub use listener::{bind, bind_candidates, ListenerError};

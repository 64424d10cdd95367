//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (lookup each variable, apply defaults)
//!     → validation.rs (first failing field wins)
//!     → Config (validated, immutable)
//!     → owned by the entry point, listen address handed to the server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Every field except the upstream API key has a default
//! - An empty variable is treated the same as an unset one

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::Config;
pub use validation::ConfigError;

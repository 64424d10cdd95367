//! Configuration validation.
//!
//! # Design Decisions
//! - Fields are checked in a fixed order; the first failure is returned
//! - Validation is a pure function of the loaded values

use thiserror::Error;

use crate::config::schema::*;

/// A single invalid setting, named by its environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid config: {var} {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: &'static str,
}

impl ConfigError {
    fn new(var: &'static str, reason: &'static str) -> Self {
        Self { var, reason }
    }
}

impl Config {
    /// Check every setting, returning the first one that is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_api_key.is_empty() {
            return Err(ConfigError::new(ENV_UPSTREAM_API_KEY, "must be set (no default)"));
        }

        let required = [
            (ENV_UPSTREAM_BASE_URL, &self.upstream_base_url),
            (ENV_LISTEN_ADDR, &self.listen_addr),
            (ENV_TOOL_DIR, &self.tool_dir),
            (ENV_TELEMETRY_PATH, &self.telemetry_path),
        ];
        for (var, value) in required {
            if value.is_empty() {
                return Err(ConfigError::new(var, "must not be empty"));
            }
        }

        Ok(())
    }
}

//! Configuration loading from the environment.

use crate::config::schema::*;
use crate::config::validation::ConfigError;

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load and validate configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Config {
            listen_addr: var(ENV_LISTEN_ADDR, DEFAULT_LISTEN_ADDR),
            upstream_base_url: var(ENV_UPSTREAM_BASE_URL, DEFAULT_UPSTREAM_BASE_URL),
            upstream_api_key: lookup(ENV_UPSTREAM_API_KEY).unwrap_or_default(),
            tool_dir: var(ENV_TOOL_DIR, DEFAULT_TOOL_DIR),
            telemetry_path: var(ENV_TELEMETRY_PATH, DEFAULT_TELEMETRY_PATH),
        };

        config.validate()?;
        Ok(config)
    }
}

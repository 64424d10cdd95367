//! Configuration schema definitions.

use std::fmt;

pub const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";
pub const ENV_UPSTREAM_BASE_URL: &str = "UPSTREAM_BASE_URL";
pub const ENV_UPSTREAM_API_KEY: &str = "UPSTREAM_API_KEY";
pub const ENV_TOOL_DIR: &str = "TOOL_DIR";
pub const ENV_TELEMETRY_PATH: &str = "TELEMETRY_PATH";

pub const DEFAULT_LISTEN_ADDR: &str = ":8080";
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TOOL_DIR: &str = "./tools.d";
pub const DEFAULT_TELEMETRY_PATH: &str = "./runs.jsonl";

/// Settings for the service, all sourced from the environment.
///
/// Only `listen_addr` is consumed in-process today; the upstream and tool
/// settings are validated here so a misconfigured deployment fails at boot.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP listen address, e.g. ":8080" or "127.0.0.1:9000".
    pub listen_addr: String,

    /// Base URL of the upstream LLM API.
    pub upstream_base_url: String,

    /// API key for the upstream LLM API. Required.
    pub upstream_api_key: String,

    /// Directory holding tool definition files.
    pub tool_dir: String,

    /// Path of the JSONL telemetry file.
    pub telemetry_path: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_api_key", &"<redacted>")
            .field("tool_dir", &self.tool_dir)
            .field("telemetry_path", &self.telemetry_path)
            .finish()
    }
}

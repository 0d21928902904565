//! Oracle client configuration.

use std::env;
use std::time::Duration;

const DEFAULT_HOST: &str = "https://ollama.com";
const DEFAULT_MODEL: &str = "gpt-oss:120b";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the chat-completion oracle.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL of the chat API
    pub host: String,
    pub model: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OracleConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables: `CALIBRA_ORACLE_HOST`, `CALIBRA_ORACLE_MODEL`,
    /// `CALIBRA_ORACLE_API_KEY`, `CALIBRA_ORACLE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = env::var("CALIBRA_ORACLE_HOST") {
            if !host.trim().is_empty() {
                config.host = host;
            }
        }
        if let Ok(model) = env::var("CALIBRA_ORACLE_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(key) = env::var("CALIBRA_ORACLE_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(secs) = env::var("CALIBRA_ORACLE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }
        config
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

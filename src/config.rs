//! Client configuration.

use std::env;
use std::time::Duration;

use chat_api::{ChatApiConfig, DEFAULT_BASE_URL};
use thiserror::Error;

pub const BACKEND_URL_ENV: &str = "CHATLINE_BACKEND_URL";
pub const HOST_ENV: &str = "CHATLINE_HOST";
pub const PORT_ENV: &str = "CHATLINE_PORT";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a port number, got '{value}'")]
    InvalidPort { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatlineConfig {
    /// Backend base address shared by REST calls and the realtime channel.
    pub base_url: String,
    /// Delay between a closed connection and the next connection attempt.
    pub reconnect_delay: Duration,
    /// Per-request timeout for REST calls.
    pub request_timeout: Option<Duration>,
    /// Append an `error` record when a tool call fails instead of only logging it.
    pub surface_tool_errors: bool,
}

impl Default for ChatlineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            request_timeout: None,
            surface_tool_errors: false,
        }
    }
}

impl ChatlineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads the backend address from the environment.
    ///
    /// `CHATLINE_BACKEND_URL` wins when set; otherwise the address is built
    /// from `CHATLINE_HOST` and `CHATLINE_PORT`. Everything else keeps its
    /// default.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(url) = env_string_opt(BACKEND_URL_ENV) {
            return Ok(Self::new(url));
        }

        let host = env_string_opt(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match env_string_opt(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort {
                    key: PORT_ENV,
                    value: raw,
                })?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(format!("http://{}:{port}", host.trim())))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_surface_tool_errors(mut self, enabled: bool) -> Self {
        self.surface_tool_errors = enabled;
        self
    }

    /// REST transport settings derived from this configuration.
    pub fn api_config(&self) -> ChatApiConfig {
        let config = ChatApiConfig::new(self.base_url.clone())
            .with_user_agent(concat!("chatline/", env!("CARGO_PKG_VERSION")));
        match self.request_timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

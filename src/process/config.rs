//! Processing client and engine configuration parsed from environment variables.

use std::time::Duration;

use crate::debounce::DEFAULT_DEBOUNCE;
use crate::source::DEFAULT_MAX_SOURCE_BYTES;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PIXELPRESS_API_URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ProcessorTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// API base URL without trailing slash; requests go to `{api_url}/process`.
    pub api_url: String,
    pub timeouts: ProcessorTimeouts,
    pub debounce: Duration,
    pub max_source_bytes: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeouts: ProcessorTimeouts::default(),
            debounce: DEFAULT_DEBOUNCE,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

impl ProcessorConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PIXELPRESS_API_URL`: default `http://localhost:5000/api`
    /// - `PIXELPRESS_REQUEST_TIMEOUT_SECS`: default 120
    /// - `PIXELPRESS_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PIXELPRESS_DEBOUNCE_MS`: default 500
    /// - `PIXELPRESS_MAX_SOURCE_BYTES`: default 4 MiB
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("PIXELPRESS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::default().with_api_url(&api_url)?;
        config.timeouts = ProcessorTimeouts {
            request_secs: env_parse("PIXELPRESS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("PIXELPRESS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        config.debounce = Duration::from_millis(env_parse("PIXELPRESS_DEBOUNCE_MS", millis(DEFAULT_DEBOUNCE)));
        config.max_source_bytes = env_parse("PIXELPRESS_MAX_SOURCE_BYTES", DEFAULT_MAX_SOURCE_BYTES);
        Ok(config)
    }

    /// Replace the base URL after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the URL does not parse or is not http(s).
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let trimmed = url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(trimmed)
            .map_err(|e| ConfigError::InvalidApiUrl { url: url.to_string(), reason: e.to_string() })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl { url: url.to_string(), reason: "scheme must be http or https".into() });
        }
        self.api_url = trimmed.to_string();
        Ok(self)
    }

    /// Full URL of the processing endpoint.
    #[must_use]
    pub fn process_url(&self) -> String {
        format!("{}/process", self.api_url)
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

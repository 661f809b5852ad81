//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! The backend base URL depends on the build environment: development
//! talks to a local API, production reads its own URL variables. Every
//! endpoint path lives in [`endpoints`] so callers never hand-build paths.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOKEN_DIR: &str = ".studio";

/// REST endpoint paths relative to the API base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/api/login";
    pub const REGISTER: &str = "/api/register";
    pub const LOGOUT: &str = "/api/logout";
    pub const ME: &str = "/api/me";
    pub const PROFILE: &str = "/api/profile";
}

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown STUDIO_ENV: {0}")]
    UnknownEnvironment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub environment: Environment,
    /// API base URL without a trailing slash.
    pub base_url: String,
    pub timeouts: Timeouts,
    /// Directory holding the persisted credential token.
    pub token_dir: PathBuf,
}

impl ClientConfig {
    /// Config pointing at `base_url` with default timeouts and token dir.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            environment: Environment::Development,
            base_url: normalize_base_url(base_url),
            timeouts: Timeouts::default(),
            token_dir: PathBuf::from(DEFAULT_TOKEN_DIR),
        }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `STUDIO_ENV`: `development` (default) or `production`
    /// - `STUDIO_API_URL_DEV`: base URL in development
    /// - `STUDIO_API_URL_PROD`, then `STUDIO_API_URL`: base URL in production
    /// - `STUDIO_REQUEST_TIMEOUT_SECS`: default 30
    /// - `STUDIO_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STUDIO_TOKEN_DIR`: default `.studio`
    ///
    /// # Errors
    ///
    /// Returns an error if `STUDIO_ENV` names an unknown environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = parse_environment(std::env::var("STUDIO_ENV").ok().as_deref())?;

        let base_url = match environment {
            Environment::Development => std::env::var("STUDIO_API_URL_DEV").ok(),
            Environment::Production => std::env::var("STUDIO_API_URL_PROD")
                .ok()
                .or_else(|| std::env::var("STUDIO_API_URL").ok()),
        }
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        let timeouts = Timeouts {
            request_secs: env_parse_u64("STUDIO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("STUDIO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let token_dir = std::env::var("STUDIO_TOKEN_DIR").map_or_else(|_| PathBuf::from(DEFAULT_TOKEN_DIR), PathBuf::from);

        Ok(Self { environment, base_url: normalize_base_url(&base_url), timeouts, token_dir })
    }

    /// Replace the base URL, normalized the same way as [`ClientConfig::new`].
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    /// Full URL for an endpoint path such as [`endpoints::ME`].
    #[must_use]
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// Public URL of an uploaded file (album cover, dress photo, ...).
    #[must_use]
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_environment(raw: Option<&str>) -> Result<Environment, ConfigError> {
    match raw.map(str::trim).unwrap_or("development") {
        "development" | "dev" => Ok(Environment::Development),
        "production" | "prod" => Ok(Environment::Production),
        other => Err(ConfigError::UnknownEnvironment(other.to_owned())),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! Configuration structures
//!
//! Loaded by `marketlink_infra::config` from the environment or from a
//! JSON/TOML file. Every section has defaults except `api.base_url`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    AUTH_EXEMPT_PATHS, DEFAULT_LANDING_ROUTE, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    REFRESH_PATH,
};
use crate::errors::{MarketLinkError, Result};

/// Top-level SDK configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Configuration for the given backend with every other setting defaulted.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig::new(base_url),
            session: SessionConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `MarketLinkError::Config` for an empty or unparsable base URL,
    /// a zero timeout, or a refresh path without a leading `/`.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.session.validate()
    }
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is appended to (e.g. `https://api.example.com/v1`)
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(MarketLinkError::Config("api.base_url must not be empty".into()));
        }
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            MarketLinkError::Config(format!("api.base_url '{}' is invalid: {e}", self.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MarketLinkError::Config(format!(
                "api.base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(MarketLinkError::Config("api.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

/// Session refresh settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Endpoint exchanging a refresh token for a new access token
    pub refresh_path: String,
    /// Paths whose 401 responses are surfaced without a refresh attempt
    pub exempt_paths: Vec<String>,
    /// Route the navigator is sent to when the session cannot be renewed
    pub landing_route: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_path: REFRESH_PATH.to_string(),
            exempt_paths: AUTH_EXEMPT_PATHS.iter().map(ToString::to_string).collect(),
            landing_route: Some(DEFAULT_LANDING_ROUTE.to_string()),
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if !self.refresh_path.starts_with('/') {
            return Err(MarketLinkError::Config(format!(
                "session.refresh_path must start with '/', got '{}'",
                self.refresh_path
            )));
        }
        Ok(())
    }
}

/// Client-local credential storage settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding the stored session; `None` keeps it in memory
    pub path: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "api": { "base_url": "https://api.example.com" } }"#)
                .unwrap();

        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.session.refresh_path, "/auth/refresh");
        assert_eq!(config.session.exempt_paths.len(), AUTH_EXEMPT_PATHS.len());
        assert_eq!(config.session.landing_route.as_deref(), Some("/login"));
        assert!(config.storage.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_session_section() {
        let config: Config = toml::from_str(
            r#"
[api]
base_url = "http://localhost:4000/api"
timeout_secs = 5

[session]
refresh_path = "/v2/auth/refresh"
exempt_paths = ["/v2/auth/login"]
"#,
        )
        .unwrap();

        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.session.refresh_path, "/v2/auth/refresh");
        assert_eq!(config.session.exempt_paths, vec!["/v2/auth/login".to_string()]);
    }

    #[test]
    fn rejects_bad_base_urls() {
        assert!(Config::for_base_url("").validate().is_err());
        assert!(Config::for_base_url("not a url").validate().is_err());
        assert!(Config::for_base_url("ftp://files.example.com").validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = Config::for_base_url("https://api.example.com");
        config.api.timeout_secs = 0;

        match config.validate() {
            Err(MarketLinkError::Config(msg)) => assert!(msg.contains("timeout")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_relative_refresh_path() {
        let mut config = Config::for_base_url("https://api.example.com");
        config.session.refresh_path = "auth/refresh".into();

        assert!(config.validate().is_err());
    }
}
